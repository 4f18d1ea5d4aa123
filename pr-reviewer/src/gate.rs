//! Re-analysis gate.
//!
//! State lives only in the PR's comment stream: every bot report carries
//! [`BOT_MARKER`] and an `Analyzed commit: <sha>` line. The scan-and-parse part
//! is pure ([`last_analyzed_revision`]); [`should_analyze`] adds the host I/O.
//!
//! A failure to list comments is returned to the caller. An unreadable history
//! is not the same as an empty one.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::errors::MrResult;
use crate::git_providers::{GitHubClient, IssueComment, PullRequest};

/// Hidden marker identifying comments written by this bot.
pub const BOT_MARKER: &str = "<!-- PR-DIFF-BOT-COMMENT -->";

/// Label preceding the analyzed revision inside a report.
pub const ANALYZED_COMMIT_LABEL: &str = "Analyzed commit: ";

lazy_static! {
    static ref ANALYZED_COMMIT_RE: Regex =
        Regex::new(r"Analyzed commit: ([a-f0-9]{40})").expect("static regex");
}

/// Gate decision for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub should_analyze: bool,
    pub head_sha: String,
    pub last_analyzed: Option<String>,
    /// When the report naming `last_analyzed` was posted, if the host said.
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Newest revision recorded by a bot comment, scanning newest to oldest.
///
/// `comments` is in host order (oldest first). Marker comments without a
/// parsable revision are skipped.
pub fn last_analyzed_revision(comments: &[IssueComment]) -> Option<String> {
    last_report(comments).map(|(_, sha)| sha)
}

fn last_report(comments: &[IssueComment]) -> Option<(&IssueComment, String)> {
    comments.iter().rev().find_map(|c| {
        let body = c.body.as_deref()?;
        if !body.contains(BOT_MARKER) {
            return None;
        }
        let sha = ANALYZED_COMMIT_RE.captures(body)?.get(1)?.as_str().to_string();
        Some((c, sha))
    })
}

/// Pure decision: analyze unless the newest marker already names `head_sha`.
pub fn decide(head_sha: &str, comments: &[IssueComment]) -> GateDecision {
    let last = last_report(comments);
    let analyzed_at = last.as_ref().and_then(|(c, _)| c.created_at);
    let last_analyzed = last.map(|(_, sha)| sha);
    GateDecision {
        should_analyze: last_analyzed.as_deref() != Some(head_sha),
        head_sha: head_sha.to_string(),
        last_analyzed,
        analyzed_at,
    }
}

/// Reads the PR's comments and decides whether `pr` needs (re-)analysis.
///
/// Returns `(should_analyze, head_sha)`.
///
/// # Errors
/// Any failure listing comments.
pub async fn should_analyze(host: &GitHubClient, pr: &PullRequest) -> MrResult<(bool, String)> {
    let comments = host.list_issue_comments(&pr.id).await?;
    let d = decide(&pr.head_sha, &comments);

    match &d.last_analyzed {
        None => info!(pr = %pr.id, "no previous analysis found, will analyze"),
        Some(last) if d.should_analyze => info!(
            pr = %pr.id,
            last = short(last),
            current = short(&d.head_sha),
            analyzed_at = ?d.analyzed_at,
            "new commits found, will re-analyze"
        ),
        Some(_) => info!(
            pr = %pr.id,
            analyzed_at = ?d.analyzed_at,
            "already analyzed at current head, skipping"
        ),
    }

    Ok((d.should_analyze, d.head_sha))
}

fn short(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
