//! Host-agnostic data model for pull requests, changed files and comments.
//!
//! These are the normalized outputs of the GitHub client and the inputs of the
//! gate, the summarizer and the publisher.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, MrResult};

/// A unique reference to a pull request: `owner/repo` + number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestId {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestId {
    /// Parses an `owner/repo` identifier.
    ///
    /// # Errors
    /// [`Error::Validation`] unless the input is exactly two non-empty segments.
    pub fn parse(full_name: &str, number: u64) -> MrResult<Self> {
        let mut parts = full_name.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            }),
            _ => Err(Error::Validation(format!(
                "repository must look like owner/repo, got {full_name:?}"
            ))),
        }
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// High-level metadata for a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PullRequestId,
    pub title: String,
    pub body: Option<String>,
    /// Commit currently at the tip of the PR branch.
    pub head_sha: String,
    pub html_url: String,
}

/// Per-file status tag. Unknown host tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Other(String),
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Other(s) => s,
        }
    }
}

impl From<String> for FileStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "added" => FileStatus::Added,
            "modified" => FileStatus::Modified,
            "removed" => FileStatus::Removed,
            _ => FileStatus::Other(s),
        }
    }
}

impl From<FileStatus> for String {
    fn from(s: FileStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed file of the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    /// Unified diff fragment; absent for binary or too-large files.
    #[serde(default)]
    pub patch: Option<String>,
}

/// A conversation comment on the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Identifiers of a freshly created comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedComment {
    pub id: u64,
    pub html_url: String,
}
