//! Git commit metadata for the payload's `git` section

use git2::Repository;
use serde::Serialize;
use std::path::Path;

/// Head commit details
#[derive(Debug, Clone, Default, Serialize)]
pub struct GitHead {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    pub message: String,
}

/// A configured remote
#[derive(Debug, Clone, Serialize)]
pub struct GitRemote {
    pub name: String,
    pub url: String,
}

/// The optional `git` section of the payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct GitMetadata {
    pub head: GitHead,
    pub branch: String,
    pub remotes: Vec<GitRemote>,
}

/// Read HEAD commit metadata from the repository containing `path`.
/// Returns None when there is no repository or no commit to describe;
/// the payload simply omits its git section in that case.
pub fn resolve_git_metadata(path: &Path, branch_override: Option<&str>) -> Option<GitMetadata> {
    let repo = Repository::discover(path).ok()?;
    let head_ref = repo.head().ok()?;
    let commit = head_ref.peel_to_commit().ok()?;

    let branch = branch_override
        .map(|b| b.to_string())
        .or_else(|| head_ref.shorthand().map(|s| s.to_string()))
        .unwrap_or_default();

    let mut remotes = Vec::new();
    if let Ok(names) = repo.remotes() {
        for name in names.iter().flatten() {
            if let Ok(remote) = repo.find_remote(name) {
                if let Some(url) = remote.url() {
                    remotes.push(GitRemote {
                        name: name.to_string(),
                        url: url.to_string(),
                    });
                }
            }
        }
    }

    let author = commit.author();
    let committer = commit.committer();

    Some(GitMetadata {
        head: GitHead {
            id: commit.id().to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
        },
        branch,
        remotes,
    })
}
