//! LCOV text parser
//!
//! Line-oriented records: `SF:` opens a source file, `DA:<line>,<count>`
//! marks an instrumented line, `end_of_record` closes the file. Function
//! and branch records carry no line hits and are ignored.

use crate::error::CoverageError;
use crate::model::{normalize_path, ParsedReport, ReportFormat, SourceFileCoverage};

use super::parse_count;

const FORMAT: ReportFormat = ReportFormat::Lcov;

/// Parse LCOV tracefile content
pub fn parse_lcov(
    location: &str,
    content: &str,
    report: &mut ParsedReport,
) -> Result<(), CoverageError> {
    let mut current: Option<SourceFileCoverage> = None;

    for line in content.lines() {
        let line = line.trim();

        if let Some(path) = line.strip_prefix("SF:") {
            if current.is_some() {
                return Err(CoverageError::malformed(
                    FORMAT,
                    location,
                    "source file record opened before the previous end_of_record",
                ));
            }
            if path.is_empty() {
                return Err(CoverageError::malformed(
                    FORMAT,
                    location,
                    "SF record is missing its file path",
                ));
            }
            current = Some(SourceFileCoverage::new(normalize_path(path)));
        } else if let Some(rest) = line.strip_prefix("DA:") {
            let file = current.as_mut().ok_or_else(|| {
                CoverageError::malformed(
                    FORMAT,
                    location,
                    "DA record outside of a source file record",
                )
            })?;

            // DA:<line>,<count>[,<checksum>]
            let mut parts = rest.splitn(3, ',');
            let line_field = parts.next().unwrap_or("");
            let count_field = parts.next().ok_or_else(|| {
                CoverageError::malformed(
                    FORMAT,
                    location,
                    format!("DA record is missing its hit count: {}", rest),
                )
            })?;

            let line_no = parse_count(FORMAT, location, "DA line number", line_field)?;
            let count = parse_count(FORMAT, location, "DA hit count", count_field)?;
            if line_no == 0 {
                return Err(CoverageError::malformed(
                    FORMAT,
                    location,
                    "DA line numbers are 1-indexed",
                ));
            }

            file.record(line_no, count);
        } else if line == "end_of_record" {
            let file = current.take().ok_or_else(|| {
                CoverageError::malformed(
                    FORMAT,
                    location,
                    "end_of_record without an open source file record",
                )
            })?;
            report.push_file(file);
        }
    }

    if current.is_some() {
        return Err(CoverageError::malformed(
            FORMAT,
            location,
            "unterminated source file record (missing end_of_record)",
        ));
    }

    Ok(())
}
