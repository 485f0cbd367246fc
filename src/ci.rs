//! CI environment detection
//!
//! Resolves the job id, service name and branch advertised by the CI
//! system running the conversion. CLI flags always win over detected
//! values; defaults apply last.

use std::collections::HashMap;

/// Values a CI environment advertises about the current job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub service_name: Option<String>,
    pub service_job_id: Option<String>,
    pub branch: Option<String>,
}

/// Detect the CI environment from the process environment
pub fn detect() -> CiEnvironment {
    from_env(&std::env::vars().collect())
}

/// Detect the CI environment from an explicit variable map
pub fn from_env(vars: &HashMap<String, String>) -> CiEnvironment {
    let truthy = |key: &str| {
        vars.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
    let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

    if truthy("TRAVIS") {
        return CiEnvironment {
            service_name: Some("travis-ci".to_string()),
            service_job_id: get("TRAVIS_JOB_ID"),
            branch: get("TRAVIS_BRANCH"),
        };
    }

    if truthy("APPVEYOR") {
        return CiEnvironment {
            service_name: Some("appveyor".to_string()),
            service_job_id: get("APPVEYOR_JOB_ID"),
            branch: get("APPVEYOR_REPO_BRANCH"),
        };
    }

    if truthy("GITHUB_ACTIONS") {
        return CiEnvironment {
            service_name: Some("github-actions".to_string()),
            service_job_id: get("GITHUB_RUN_ID"),
            branch: get("GITHUB_REF_NAME"),
        };
    }

    if truthy("GITLAB_CI") {
        return CiEnvironment {
            service_name: Some("gitlab-ci".to_string()),
            service_job_id: get("CI_JOB_ID"),
            branch: get("CI_COMMIT_BRANCH"),
        };
    }

    CiEnvironment::default()
}
