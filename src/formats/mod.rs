//! Coverage report parsers
//!
//! Provides:
//! - Monocov per-class XML parsing
//! - OpenCover XML parsing
//! - Visual Studio dynamic code coverage XML parsing
//! - LCOV text parsing
//! - Chutzpah JSON parsing

mod chutzpah;
mod dynamic_code_coverage;
mod lcov;
mod monocov;
mod opencover;

pub use chutzpah::*;
pub use dynamic_code_coverage::*;
pub use lcov::*;
pub use monocov::*;
pub use opencover::*;

use std::collections::HashMap;

use crate::error::CoverageError;
use crate::model::{ParsedReport, ReportFormat, SourceFileCoverage};

/// Raw report content handed to a parser, already loaded from disk
#[derive(Debug, Clone)]
pub enum ReportSource {
    /// One report file
    Content { location: String, text: String },
    /// A directory report: named fragments in sorted order
    Fragments {
        location: String,
        parts: Vec<(String, String)>,
    },
}

impl ReportSource {
    pub fn content(location: impl Into<String>, text: impl Into<String>) -> Self {
        ReportSource::Content {
            location: location.into(),
            text: text.into(),
        }
    }

    pub fn fragments(location: impl Into<String>, parts: Vec<(String, String)>) -> Self {
        ReportSource::Fragments {
            location: location.into(),
            parts,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ReportSource::Content { location, .. } => location,
            ReportSource::Fragments { location, .. } => location,
        }
    }

    /// View as named fragments; single-file content becomes one fragment
    fn parts(&self) -> Vec<(&str, &str)> {
        match self {
            ReportSource::Content { location, text } => vec![(location.as_str(), text.as_str())],
            ReportSource::Fragments { parts, .. } => parts
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_str()))
                .collect(),
        }
    }
}

/// Parse raw report content with the parser for the given format.
///
/// Fragments of a directory report are unioned into a single report before
/// returning; on error no partial data is exposed.
pub fn parse_report(
    format: ReportFormat,
    source: &ReportSource,
) -> Result<ParsedReport, CoverageError> {
    let mut report = ParsedReport::new(format);

    for (name, content) in source.parts() {
        match format {
            ReportFormat::Monocov => parse_monocov(name, content, &mut report)?,
            ReportFormat::OpenCover => parse_opencover(name, content, &mut report)?,
            ReportFormat::DynamicCodeCoverage => {
                parse_dynamic_code_coverage(name, content, &mut report)?
            }
            ReportFormat::Lcov => parse_lcov(name, content, &mut report)?,
            ReportFormat::Chutzpah => parse_chutzpah(name, content, &mut report)?,
        }
    }

    Ok(report)
}

/// Parse a non-negative integer field, reporting the offending value
pub(crate) fn parse_count(
    format: ReportFormat,
    location: &str,
    what: &str,
    raw: &str,
) -> Result<u32, CoverageError> {
    raw.trim().parse::<u32>().map_err(|_| {
        CoverageError::malformed(
            format,
            location,
            format!("{} is not a non-negative integer: {}", what, raw),
        )
    })
}

/// Record hits against a path-indexed list of records kept in
/// first-reference order
pub(crate) fn record_hit(
    records: &mut Vec<SourceFileCoverage>,
    index: &mut HashMap<String, usize>,
    path: &str,
    line: u32,
    hits: u32,
) {
    let idx = match index.get(path) {
        Some(&i) => i,
        None => {
            index.insert(path.to_string(), records.len());
            records.push(SourceFileCoverage::new(path));
            records.len() - 1
        }
    };
    records[idx].record(line, hits);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_rejects_negative_and_garbage() {
        assert_eq!(
            parse_count(ReportFormat::Lcov, "cov.info", "hit count", "12").unwrap(),
            12
        );
        assert!(parse_count(ReportFormat::Lcov, "cov.info", "hit count", "-1").is_err());
        assert!(parse_count(ReportFormat::Lcov, "cov.info", "hit count", "abc").is_err());
    }

    #[test]
    fn test_single_content_parses_as_one_fragment() {
        let source = ReportSource::content(
            "cov.info",
            "SF:src/main.rs\nDA:1,1\nend_of_record\n",
        );
        let report = parse_report(ReportFormat::Lcov, &source).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].path, "src/main.rs");
    }
}
