//! Visual Studio dynamic code coverage XML parser
//!
//! Reads the `results` document produced by `CodeCoverage.exe analyze`:
//! `source_file` tables keyed by id and `range` spans marking a run of
//! lines as covered or not. The table can appear after the ranges that
//! reference it, so ranges are resolved once the document is fully read.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

use crate::error::CoverageError;
use crate::model::{normalize_path, ParsedReport, ReportFormat};

use super::{parse_count, record_hit};

const FORMAT: ReportFormat = ReportFormat::DynamicCodeCoverage;

struct RawRange {
    source_id: String,
    start_line: u32,
    end_line: u32,
    hits: u32,
}

/// Parse a dynamic code coverage results document
pub fn parse_dynamic_code_coverage(
    location: &str,
    xml: &str,
    report: &mut ParsedReport,
) -> Result<(), CoverageError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // id -> normalized path
    let mut sources: HashMap<String, String> = HashMap::new();
    let mut ranges: Vec<RawRange> = Vec::new();
    let mut seen_results = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"results" => seen_results = true,
                b"source_file" => {
                    let mut id = None;
                    let mut path = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        match attr.key.as_ref() {
                            b"id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                            b"path" => {
                                path = Some(String::from_utf8_lossy(&attr.value).to_string())
                            }
                            _ => {}
                        }
                    }
                    match (id, path) {
                        (Some(id), Some(path)) => {
                            sources.insert(id, normalize_path(&path));
                        }
                        _ => {
                            return Err(CoverageError::malformed(
                                FORMAT,
                                location,
                                "source_file element is missing its id or path attribute",
                            ))
                        }
                    }
                }
                b"range" => {
                    ranges.push(parse_range(location, e)?);
                }
                _ => {}
            },
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

    if !seen_results {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "missing results root element",
        ));
    }

    let mut records = Vec::new();
    let mut index = HashMap::new();
    for range in ranges {
        let path = sources.get(&range.source_id).ok_or_else(|| {
            CoverageError::malformed(
                FORMAT,
                location,
                format!("range references unknown source_file id {}", range.source_id),
            )
        })?;
        for line in range.start_line..=range.end_line {
            record_hit(&mut records, &mut index, path, line, range.hits);
        }
    }

    for file in records {
        report.push_file(file);
    }

    Ok(())
}

fn parse_range(
    location: &str,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<RawRange, CoverageError> {
    let mut source_id = None;
    let mut covered = None;
    let mut start_line = None;
    let mut end_line = None;

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"source_id" => source_id = Some(value),
            b"covered" => covered = Some(value),
            b"start_line" => {
                start_line = Some(parse_count(FORMAT, location, "range start_line", &value)?)
            }
            b"end_line" => end_line = Some(parse_count(FORMAT, location, "range end_line", &value)?),
            _ => {}
        }
    }

    let missing = |what: &str| {
        CoverageError::malformed(
            FORMAT,
            location,
            format!("range element is missing its {} attribute", what),
        )
    };
    let source_id = source_id.ok_or_else(|| missing("source_id"))?;
    let covered = covered.ok_or_else(|| missing("covered"))?;
    let start_line = start_line.ok_or_else(|| missing("start_line"))?;
    let end_line = end_line.ok_or_else(|| missing("end_line"))?;

    // partial ranges did execute, so they count as covered
    let hits = match covered.as_str() {
        "yes" | "partial" => 1,
        "no" => 0,
        other => {
            return Err(CoverageError::malformed(
                FORMAT,
                location,
                format!("unrecognized covered value: {}", other),
            ))
        }
    };

    if start_line == 0 {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "range line numbers are 1-indexed",
        ));
    }
    if start_line > end_line {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "range start_line is greater than end_line",
        ));
    }

    Ok(RawRange {
        source_id,
        start_line,
        end_line,
        hits,
    })
}
