//! Publisher.
//!
//! Posts the rendered report as a single PR conversation comment.
//!
//! - Idempotency is handled upstream by the gate (hidden marker + SHA line).
//! - Dry-run: render and return the report without calling the API.

pub mod report;

use std::time::Instant;

use tracing::info;

use crate::errors::MrResult;
use crate::git_providers::{GitHubClient, PostedComment, PullRequestId};

pub use report::render_report;

/// Result of publishing one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    /// Nothing was sent.
    DryRun,
    Posted(PostedComment),
}

/// Posts `body` on the PR unless `dry_run` is set.
pub async fn publish(
    host: &GitHubClient,
    id: &PullRequestId,
    body: &str,
    dry_run: bool,
) -> MrResult<Published> {
    if dry_run {
        info!(pr = %id, bytes = body.len(), "dry run: skipping comment creation");
        return Ok(Published::DryRun);
    }

    let t0 = Instant::now();
    let posted = host.create_issue_comment(id, body).await?;
    info!(
        pr = %id,
        comment_id = posted.id,
        url = %posted.html_url,
        elapsed_ms = t0.elapsed().as_millis(),
        "analysis posted"
    );
    Ok(Published::Posted(posted))
}
