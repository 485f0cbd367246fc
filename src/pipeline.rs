//! Conversion pipeline
//!
//! The single entry point tying the stages together:
//! parse -> merge -> build. Requests are processed in declared order, so
//! the first format named on the command line establishes file discovery
//! order in the output.

use crate::error::CoverageError;
use crate::formats::{parse_report, ReportSource};
use crate::merge::CanonicalCoverageSet;
use crate::model::{normalize_path, ReportFormat};
use crate::payload::{build_payload, CoverallsPayload, JobMetadata};

/// One format/input pair to convert
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub format: ReportFormat,
    pub source: ReportSource,
}

/// Knobs applied uniformly to every parsed record
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Prefix stripped from source paths to make them repository-relative
    pub base_path: Option<String>,
}

/// Run the full pipeline over the requests in declared order
pub fn convert(
    requests: Vec<ConversionRequest>,
    options: &ConvertOptions,
    metadata: JobMetadata,
) -> Result<CoverallsPayload, CoverageError> {
    let mut set = CanonicalCoverageSet::new();

    for request in requests {
        let mut report = parse_report(request.format, &request.source)?;
        if let Some(base) = &options.base_path {
            for file in &mut report.files {
                file.path = strip_base_path(&file.path, base);
            }
        }
        set.merge(report);
    }

    Ok(build_payload(metadata, set))
}

/// Make a path repository-relative by removing the base prefix.
/// Only strips at a path boundary; non-matching paths pass through.
fn strip_base_path(path: &str, base: &str) -> String {
    let base = normalize_path(base);
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }

    if let Some(rest) = path.strip_prefix(base) {
        if rest.is_empty() {
            return String::new();
        }
        if let Some(rest) = rest.strip_prefix('/') {
            return rest.to_string();
        }
    }
    path.to_string()
}
