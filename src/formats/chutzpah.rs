//! Chutzpah JSON coverage parser
//!
//! The Chutzpah export is a JSON object mapping each source path to a
//! per-file object. `lineExecutionCounts` is a 1-based array whose index 0
//! entry is padding; entries are `null` for non-instrumented lines.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoverageError;
use crate::model::{normalize_path, ParsedReport, ReportFormat, SourceFileCoverage};

const FORMAT: ReportFormat = ReportFormat::Chutzpah;

#[derive(Debug, Deserialize)]
struct ChutzpahFile {
    #[serde(rename = "filePath")]
    file_path: Option<String>,
    #[serde(rename = "lineExecutionCounts")]
    line_execution_counts: Vec<Option<i64>>,
}

/// Parse a Chutzpah coverage JSON document
pub fn parse_chutzpah(
    location: &str,
    content: &str,
    report: &mut ParsedReport,
) -> Result<(), CoverageError> {
    let root: Value = serde_json::from_str(content).map_err(|e| {
        CoverageError::malformed(FORMAT, location, format!("invalid JSON: {}", e))
    })?;
    let entries = root.as_object().ok_or_else(|| {
        CoverageError::malformed(FORMAT, location, "top level is not a JSON object")
    })?;

    for (key, value) in entries {
        let entry: ChutzpahFile = serde_json::from_value(value.clone()).map_err(|e| {
            CoverageError::malformed(
                FORMAT,
                location,
                format!("coverage entry {} is malformed: {}", key, e),
            )
        })?;

        let path = entry.file_path.as_deref().unwrap_or(key.as_str());
        let mut file = SourceFileCoverage::new(normalize_path(path));

        // index 0 is padding; index n covers line n
        for (line, counts) in entry.line_execution_counts.iter().enumerate().skip(1) {
            if let Some(count) = counts {
                let count = u32::try_from(*count).map_err(|_| {
                    CoverageError::malformed(
                        FORMAT,
                        location,
                        format!("hit count {} for {} is out of range", count, path),
                    )
                })?;
                file.record(line as u32, count);
            }
        }

        report.push_file(file);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chutzpah() {
        let json = r#"{
  "/scripts/app.js": {
    "filePath": "/scripts/app.js",
    "lineExecutionCounts": [null, 1, 0, null, 4],
    "sourceLines": ["var a;", "run();", "die();", ""],
    "coveragePercentage": 0.66
  },
  "/scripts/util.js": {
    "filePath": "/scripts/util.js",
    "lineExecutionCounts": [null, 2]
  }
}"#;

        let mut report = ParsedReport::new(ReportFormat::Chutzpah);
        parse_chutzpah("coverage.json", json, &mut report).unwrap();

        assert_eq!(report.files.len(), 2);
        let app = &report.files[0];
        assert_eq!(app.path, "/scripts/app.js");
        assert_eq!(app.line_hits, vec![Some(1), Some(0), None, Some(4)]);
        assert_eq!(report.files[1].line_hits, vec![Some(2)]);
    }

    #[test]
    fn test_key_used_when_file_path_missing() {
        let json = r#"{"/scripts/app.js": {"lineExecutionCounts": [null, 1]}}"#;
        let mut report = ParsedReport::new(ReportFormat::Chutzpah);
        parse_chutzpah("coverage.json", json, &mut report).unwrap();
        assert_eq!(report.files[0].path, "/scripts/app.js");
    }

    #[test]
    fn test_negative_count_fails() {
        let json = r#"{"/scripts/app.js": {"lineExecutionCounts": [null, -1]}}"#;
        let mut report = ParsedReport::new(ReportFormat::Chutzpah);
        let err = parse_chutzpah("coverage.json", json, &mut report).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedReport { .. }));
        assert!(report.is_empty());
    }

    #[test]
    fn test_truncated_json_fails() {
        let mut report = ParsedReport::new(ReportFormat::Chutzpah);
        assert!(parse_chutzpah("coverage.json", r#"{"/a.js": {"lineExec"#, &mut report).is_err());
    }

    #[test]
    fn test_non_object_top_level_fails() {
        let mut report = ParsedReport::new(ReportFormat::Chutzpah);
        assert!(parse_chutzpah("coverage.json", "[1,2,3]", &mut report).is_err());
    }
}
