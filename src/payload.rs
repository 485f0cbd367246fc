//! Coveralls payload construction
//!
//! Renders the merged coverage set plus run metadata into the exact JSON
//! document shape the aggregation service expects.

use serde::Serialize;

use crate::git_info::GitMetadata;
use crate::merge::CanonicalCoverageSet;

/// Run metadata supplied by the CLI layer
#[derive(Debug, Clone, Default)]
pub struct JobMetadata {
    pub repo_token: String,
    pub service_job_id: String,
    pub service_name: String,
    pub parallel: bool,
    pub git: Option<GitMetadata>,
}

/// One file entry in the payload. `coverage` keeps `null` for
/// non-instrumented lines so they stay distinct from zero-hit lines.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFileEntry {
    pub name: String,
    pub coverage: Vec<Option<u32>>,
}

/// The upload document
#[derive(Debug, Clone, Serialize)]
pub struct CoverallsPayload {
    pub repo_token: String,
    pub service_job_id: String,
    pub service_name: String,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitMetadata>,
    pub source_files: Vec<SourceFileEntry>,
}

/// Render the merged set and run metadata into the upload document.
/// File entries keep the set's insertion order.
pub fn build_payload(metadata: JobMetadata, set: CanonicalCoverageSet) -> CoverallsPayload {
    let source_files = set
        .into_files()
        .into_iter()
        .map(|file| SourceFileEntry {
            name: file.path,
            coverage: file.line_hits,
        })
        .collect();

    CoverallsPayload {
        repo_token: metadata.repo_token,
        service_job_id: metadata.service_job_id,
        service_name: metadata.service_name,
        parallel: metadata.parallel,
        git: metadata.git,
        source_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParsedReport, ReportFormat, SourceFileCoverage};

    fn sample_set() -> CanonicalCoverageSet {
        let mut report = ParsedReport::new(ReportFormat::Lcov);
        let mut file = SourceFileCoverage::new("src/main.rs");
        file.record(1, 1);
        file.record(3, 0);
        report.push_file(file);

        let mut set = CanonicalCoverageSet::new();
        set.merge(report);
        set
    }

    fn sample_metadata() -> JobMetadata {
        JobMetadata {
            repo_token: "MYTESTREPOTOKEN".to_string(),
            service_job_id: "0".to_string(),
            service_name: "covup".to_string(),
            parallel: false,
            git: None,
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = build_payload(sample_metadata(), sample_set());
        let json = serde_json::to_string(&payload).unwrap();

        assert_eq!(
            json,
            r#"{"repo_token":"MYTESTREPOTOKEN","service_job_id":"0","service_name":"covup","parallel":false,"source_files":[{"name":"src/main.rs","coverage":[1,null,0]}]}"#
        );
    }

    #[test]
    fn test_null_and_zero_stay_distinct() {
        let payload = build_payload(sample_metadata(), sample_set());
        let json = serde_json::to_string(&payload).unwrap();

        assert!(json.contains("[1,null,0]"));
    }

    #[test]
    fn test_git_section_present_when_resolved() {
        let mut metadata = sample_metadata();
        metadata.git = Some(GitMetadata::default());

        let payload = build_payload(metadata, sample_set());
        let json = serde_json::to_string(&payload).unwrap();

        assert!(json.contains(r#""git":{"#));
    }

    #[test]
    fn test_empty_set_builds_empty_source_files() {
        let payload = build_payload(sample_metadata(), CanonicalCoverageSet::new());
        assert!(payload.source_files.is_empty());
    }
}
