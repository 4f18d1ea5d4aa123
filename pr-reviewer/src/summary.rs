//! Change summarizer: aggregate counts, notable-change lines, head contents.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::git_providers::{ChangeRecord, FileStatus, GitHubClient, PullRequest};

/// Files with more changed lines than this are reported as major changes.
pub const MAJOR_CHANGE_THRESHOLD: u64 = 50;

/// Aggregate view of a PR's changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub files_changed: usize,
    pub additions: u64,
    pub deletions: u64,
    pub files: Vec<ChangeRecord>,
    /// Notable-change lines, in file order.
    pub summary: Vec<String>,
    /// Full text at the head revision, for files that could be fetched.
    pub file_contents: BTreeMap<String, String>,
}

/// At most one summary line per file; first matching rule wins.
pub fn classify(rec: &ChangeRecord) -> Option<String> {
    if rec.changes > MAJOR_CHANGE_THRESHOLD {
        Some(format!(
            "Major changes in {}: +{}/-{} lines",
            rec.filename, rec.additions, rec.deletions
        ))
    } else if rec.status == FileStatus::Removed {
        Some(format!("Deleted file: {}", rec.filename))
    } else if rec.status == FileStatus::Added {
        Some(format!("New file: {}", rec.filename))
    } else {
        None
    }
}

/// Pure part of summarization: counts, records and summary lines.
pub fn summarize(files: Vec<ChangeRecord>) -> AnalysisReport {
    let mut report = AnalysisReport {
        files_changed: files.len(),
        ..AnalysisReport::default()
    };
    for rec in files {
        report.additions += rec.additions;
        report.deletions += rec.deletions;
        if let Some(line) = classify(&rec) {
            report.summary.push(line);
        }
        report.files.push(rec);
    }
    report
}

/// Summarizes and then fetches head contents of every non-removed file.
///
/// A failed fetch only drops that file from `file_contents`.
pub async fn summarize_pull_request(
    host: &GitHubClient,
    pr: &PullRequest,
    files: Vec<ChangeRecord>,
) -> AnalysisReport {
    let mut report = summarize(files);

    for rec in report.files.iter().filter(|r| r.status != FileStatus::Removed) {
        match host
            .get_file_content(&pr.id, &rec.filename, &pr.head_sha)
            .await
        {
            Ok(text) => {
                debug!(path = %rec.filename, bytes = text.len(), "fetched head content");
                report.file_contents.insert(rec.filename.clone(), text);
            }
            Err(e) => warn!(path = %rec.filename, error = %e, "could not fetch content"),
        }
    }

    report
}
