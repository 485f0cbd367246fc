//! OpenCover XML parser
//!
//! Reads an OpenCover `CoverageSession` document: per-module `File` tables
//! keyed by uid, methods carrying a `FileRef` and a list of
//! `SequencePoint` elements with visit counts.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

use crate::error::CoverageError;
use crate::model::{normalize_path, ParsedReport, ReportFormat};

use super::{parse_count, record_hit};

const FORMAT: ReportFormat = ReportFormat::OpenCover;

/// Parse an OpenCover session document
pub fn parse_opencover(
    location: &str,
    xml: &str,
    report: &mut ParsedReport,
) -> Result<(), CoverageError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // uid -> normalized path, collected from the File tables
    let mut files: HashMap<String, String> = HashMap::new();
    let mut records = Vec::new();
    let mut index = HashMap::new();
    let mut current_file_ref: Option<String> = None;
    let mut seen_session = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"CoverageSession" => seen_session = true,
                b"File" => {
                    let mut uid = None;
                    let mut full_path = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        match attr.key.as_ref() {
                            b"uid" => uid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                            b"fullPath" => {
                                full_path = Some(String::from_utf8_lossy(&attr.value).to_string())
                            }
                            _ => {}
                        }
                    }
                    match (uid, full_path) {
                        (Some(uid), Some(path)) => {
                            files.insert(uid, normalize_path(&path));
                        }
                        _ => {
                            return Err(CoverageError::malformed(
                                FORMAT,
                                location,
                                "File element is missing its uid or fullPath attribute",
                            ))
                        }
                    }
                }
                b"FileRef" => {
                    let mut uid = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        if attr.key.as_ref() == b"uid" {
                            uid = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                    current_file_ref = Some(uid.ok_or_else(|| {
                        CoverageError::malformed(
                            FORMAT,
                            location,
                            "FileRef element is missing its uid attribute",
                        )
                    })?);
                }
                b"SequencePoint" => {
                    // points in methods without a FileRef (compiler
                    // generated) have no source to attribute hits to
                    if let Some(uid) = current_file_ref.as_deref() {
                        let path = files.get(uid).ok_or_else(|| {
                            CoverageError::malformed(
                                FORMAT,
                                location,
                                format!("sequence point references unknown file uid {}", uid),
                            )
                        })?;
                        let (start_line, visit_count) = parse_sequence_point(location, e)?;
                        record_hit(&mut records, &mut index, path, start_line, visit_count);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"Method" {
                    current_file_ref = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CoverageError::malformed(
                    FORMAT,
                    location,
                    format!("invalid XML: {}", e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_session {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "missing CoverageSession root element",
        ));
    }

    for file in records {
        report.push_file(file);
    }

    Ok(())
}

fn parse_sequence_point(
    location: &str,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<(u32, u32), CoverageError> {
    let mut visit_count = None;
    let mut start_line = None;

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"vc" => visit_count = Some(parse_count(FORMAT, location, "visit count", &value)?),
            b"sl" => start_line = Some(parse_count(FORMAT, location, "start line", &value)?),
            _ => {}
        }
    }

    let visit_count = visit_count.ok_or_else(|| {
        CoverageError::malformed(
            FORMAT,
            location,
            "SequencePoint element is missing its vc attribute",
        )
    })?;
    let start_line = start_line.ok_or_else(|| {
        CoverageError::malformed(
            FORMAT,
            location,
            "SequencePoint element is missing its sl attribute",
        )
    })?;
    if start_line == 0 {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "sequence point line numbers are 1-indexed",
        ));
    }

    Ok((start_line, visit_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CoverageSession>
  <Modules>
    <Module>
      <Files>
        <File uid="1" fullPath="C:\src\GameOfLife\Game.cs" />
        <File uid="2" fullPath="C:\src\GameOfLife\World.cs" />
      </Files>
      <Classes>
        <Class>
          <Methods>
            <Method>
              <FileRef uid="1" />
              <SequencePoints>
                <SequencePoint vc="2" sl="10" sc="9" el="10" ec="25" />
                <SequencePoint vc="0" sl="11" sc="9" el="11" ec="25" />
              </SequencePoints>
            </Method>
            <Method>
              <SequencePoints>
                <SequencePoint vc="9" sl="99" />
              </SequencePoints>
            </Method>
            <Method>
              <FileRef uid="2" />
              <SequencePoints>
                <SequencePoint vc="1" sl="5" />
              </SequencePoints>
            </Method>
          </Methods>
        </Class>
      </Classes>
    </Module>
  </Modules>
</CoverageSession>"#;

    #[test]
    fn test_parse_session() {
        let mut report = ParsedReport::new(ReportFormat::OpenCover);
        parse_opencover("results.xml", SESSION_XML, &mut report).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].path, "C:/src/GameOfLife/Game.cs");
        assert_eq!(report.files[0].line_hits[9], Some(2));
        assert_eq!(report.files[0].line_hits[10], Some(0));
        assert_eq!(report.files[1].path, "C:/src/GameOfLife/World.cs");
        assert_eq!(report.files[1].line_hits[4], Some(1));
    }

    #[test]
    fn test_method_without_file_ref_is_skipped() {
        let mut report = ParsedReport::new(ReportFormat::OpenCover);
        parse_opencover("results.xml", SESSION_XML, &mut report).unwrap();

        // the uid-less method's point at line 99 lands nowhere
        assert!(report.files.iter().all(|f| f.line_count() < 99));
    }

    #[test]
    fn test_unknown_uid_fails() {
        let xml = r#"<CoverageSession><Modules><Module>
<Files><File uid="1" fullPath="a.cs" /></Files>
<Classes><Class><Methods><Method><FileRef uid="7" />
<SequencePoints><SequencePoint vc="1" sl="1" /></SequencePoints>
</Method></Methods></Class></Classes>
</Module></Modules></CoverageSession>"#;
        let mut report = ParsedReport::new(ReportFormat::OpenCover);
        let err = parse_opencover("results.xml", xml, &mut report).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedReport { .. }));
    }

    #[test]
    fn test_missing_session_root_fails() {
        let mut report = ParsedReport::new(ReportFormat::OpenCover);
        assert!(parse_opencover("results.xml", "<NotASession/>", &mut report).is_err());
    }

    #[test]
    fn test_negative_visit_count_fails() {
        let xml = r#"<CoverageSession><Modules><Module>
<Files><File uid="1" fullPath="a.cs" /></Files>
<Classes><Class><Methods><Method><FileRef uid="1" />
<SequencePoints><SequencePoint vc="-1" sl="1" /></SequencePoints>
</Method></Methods></Class></Classes>
</Module></Modules></CoverageSession>"#;
        let mut report = ParsedReport::new(ReportFormat::OpenCover);
        assert!(parse_opencover("results.xml", xml, &mut report).is_err());
    }
}
