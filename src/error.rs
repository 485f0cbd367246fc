//! Typed errors for the conversion core

use thiserror::Error;

use crate::model::ReportFormat;

/// Errors raised by the parsing and conversion pipeline
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Report content violates the structural grammar for its format
    #[error("malformed {format} report at {location}: {reason}")]
    MalformedReport {
        format: ReportFormat,
        location: String,
        reason: String,
    },

    /// No parser variant matches the requested format tag
    #[error("unsupported coverage format: {0} (supported: monocov, opencover, dynamiccodecoverage, lcov, chutzpah)")]
    UnsupportedFormat(String),
}

impl CoverageError {
    pub(crate) fn malformed(
        format: ReportFormat,
        location: &str,
        reason: impl Into<String>,
    ) -> Self {
        CoverageError::MalformedReport {
            format,
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}
