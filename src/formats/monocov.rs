//! Monocov per-class XML parser
//!
//! A monocov report is a directory of XML fragments. Line data lives in the
//! `class-*.xml` fragments; `namespace-*.xml`, `project.xml` and stylesheet
//! files carry none and are skipped.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use crate::error::CoverageError;
use crate::model::{normalize_path, ParsedReport, ReportFormat, SourceFileCoverage};

use super::parse_count;

const FORMAT: ReportFormat = ReportFormat::Monocov;

/// Parse one fragment of a monocov report
pub fn parse_monocov(
    fragment_name: &str,
    xml: &str,
    report: &mut ParsedReport,
) -> Result<(), CoverageError> {
    if !is_class_fragment(fragment_name) {
        return Ok(());
    }

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current: Option<SourceFileCoverage> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"source" => {
                    let mut source_file = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        if attr.key.as_ref() == b"sourceFile" {
                            source_file = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                    let path = source_file.ok_or_else(|| {
                        CoverageError::malformed(
                            FORMAT,
                            fragment_name,
                            "source element is missing its sourceFile attribute",
                        )
                    })?;
                    if let Some(file) = current.take() {
                        report.push_file(file);
                    }
                    current = Some(SourceFileCoverage::new(normalize_path(&path)));
                }
                b"statement" => {
                    let file = current.as_mut().ok_or_else(|| {
                        CoverageError::malformed(
                            FORMAT,
                            fragment_name,
                            "statement element outside of a source element",
                        )
                    })?;

                    let mut line = None;
                    let mut counter = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"line" => {
                                line = Some(parse_count(FORMAT, fragment_name, "statement line", &value)?)
                            }
                            b"counter" => {
                                counter =
                                    Some(parse_count(FORMAT, fragment_name, "statement counter", &value)?)
                            }
                            _ => {}
                        }
                    }

                    let line = line.ok_or_else(|| {
                        CoverageError::malformed(
                            FORMAT,
                            fragment_name,
                            "statement element is missing its line attribute",
                        )
                    })?;
                    let counter = counter.ok_or_else(|| {
                        CoverageError::malformed(
                            FORMAT,
                            fragment_name,
                            "statement element is missing its counter attribute",
                        )
                    })?;
                    if line == 0 {
                        return Err(CoverageError::malformed(
                            FORMAT,
                            fragment_name,
                            "statement line numbers are 1-indexed",
                        ));
                    }

                    file.record(line, counter);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"source" {
                    if let Some(file) = current.take() {
                        report.push_file(file);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CoverageError::malformed(
                    FORMAT,
                    fragment_name,
                    format!("invalid XML: {}", e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(file) = current.take() {
        report.push_file(file);
    }

    Ok(())
}

fn is_class_fragment(fragment_name: &str) -> bool {
    let name = Path::new(fragment_name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.starts_with("class-") && name.ends_with(".xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<class name="GameOfLife.Game" fullname="GameOfLife.Game" token="02000002">
  <source sourceFile="/build/src/GameOfLife/Game.cs">
    <method name="Tick">
      <statement line="12" counter="1"/>
      <statement line="13" counter="0"/>
      <statement line="15" counter="4"/>
    </method>
  </source>
</class>"#;

    #[test]
    fn test_parse_class_fragment() {
        let mut report = ParsedReport::new(ReportFormat::Monocov);
        parse_monocov("class-GameOfLife.Game.xml", CLASS_XML, &mut report).unwrap();

        assert_eq!(report.files.len(), 1);
        let file = &report.files[0];
        assert_eq!(file.path, "/build/src/GameOfLife/Game.cs");
        assert_eq!(file.line_hits[11], Some(1));
        assert_eq!(file.line_hits[12], Some(0));
        assert_eq!(file.line_hits[13], None);
        assert_eq!(file.line_hits[14], Some(4));
    }

    #[test]
    fn test_non_class_fragments_are_skipped() {
        let mut report = ParsedReport::new(ReportFormat::Monocov);
        parse_monocov("namespace-GameOfLife.xml", "<namespace/>", &mut report).unwrap();
        parse_monocov("project.xml", "<project/>", &mut report).unwrap();
        parse_monocov("style.xsl", "not xml at all", &mut report).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_missing_source_file_attribute_fails() {
        let xml = r#"<class name="X"><source><method><statement line="1" counter="1"/></method></source></class>"#;
        let mut report = ParsedReport::new(ReportFormat::Monocov);
        let err = parse_monocov("class-X.xml", xml, &mut report).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedReport { .. }));
    }

    #[test]
    fn test_negative_counter_fails() {
        let xml = r#"<class name="X"><source sourceFile="X.cs"><method><statement line="1" counter="-1"/></method></source></class>"#;
        let mut report = ParsedReport::new(ReportFormat::Monocov);
        assert!(parse_monocov("class-X.xml", xml, &mut report).is_err());
    }

    #[test]
    fn test_two_fragments_for_same_source_union() {
        let other = r#"<class name="GameOfLife.Game2" token="02000003">
  <source sourceFile="/build/src/GameOfLife/Game.cs">
    <method name="Other">
      <statement line="12" counter="2"/>
      <statement line="20" counter="1"/>
    </method>
  </source>
</class>"#;

        let mut report = ParsedReport::new(ReportFormat::Monocov);
        parse_monocov("class-GameOfLife.Game.xml", CLASS_XML, &mut report).unwrap();
        parse_monocov("class-GameOfLife.Game2.xml", other, &mut report).unwrap();

        assert_eq!(report.files.len(), 1);
        let file = &report.files[0];
        assert_eq!(file.line_hits[11], Some(3));
        assert_eq!(file.line_hits[19], Some(1));
    }
}
