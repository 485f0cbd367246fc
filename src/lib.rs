//! Covup - Coverage report converter and uploader
//!
//! A library for converting code coverage reports into the canonical
//! payload understood by Coveralls-compatible services:
//! - Format parsers (monocov, OpenCover, dynamic code coverage, LCOV, Chutzpah)
//! - A canonical per-file, per-line coverage model
//! - A merger combining reports without losing or double-counting coverage
//! - A payload builder emitting the exact upload document
//! - CI detection, git metadata and an async upload client around the core

pub mod ci;
pub mod error;
pub mod formats;
pub mod git_info;
pub mod merge;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod sources;
pub mod upload;

pub use error::CoverageError;
pub use formats::{parse_report, ReportSource};
pub use merge::CanonicalCoverageSet;
pub use model::{ParsedReport, ReportFormat, SourceFileCoverage};
pub use payload::{build_payload, CoverallsPayload, JobMetadata, SourceFileEntry};
pub use pipeline::{convert, ConversionRequest, ConvertOptions};
