//! Public entry for the pr-reviewer pipeline.
//!
//! Single high-level function to run the whole pipeline for a Pull Request.
//!
//! 1) **Fetch** PR metadata (title, body, head SHA)
//! 2) **Gate**: scan existing comments for the bot marker; stop if the head
//!    SHA was already analyzed
//! 3) **Summarize**: list changed files, tally counts, classify notable
//!    changes, fetch head contents best-effort
//! 4) **AI review**: code-review completion, then documentation completion
//! 5) **Publish**: render the Markdown report and post it (or return it in
//!    dry-run mode)
//!
//! Completion failures never abort the run; they are rendered into the report.
//! Host failures (gate, file listing, posting) abort it.

pub mod config;
pub mod errors;
pub mod gate;
pub mod git_providers;
pub mod publish;
pub mod review;
pub mod summary;

use std::time::Instant;

use ai_llm_service::{CompletionProvider, config::LlmSettings, select_provider};
use tracing::{debug, info, instrument};

use config::ReviewSettings;
use errors::MrResult;
use git_providers::{GitHubClient, PullRequestId};
use publish::Published;

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The head SHA was already analyzed; nothing was done.
    Skipped { head_sha: String },
    /// Report rendered but not posted.
    DryRun { head_sha: String, report: String },
    /// Report posted as a new comment.
    Published {
        head_sha: String,
        comment_id: u64,
        url: String,
    },
}

impl ReviewOutcome {
    pub fn head_sha(&self) -> &str {
        match self {
            ReviewOutcome::Skipped { head_sha }
            | ReviewOutcome::DryRun { head_sha, .. }
            | ReviewOutcome::Published { head_sha, .. } => head_sha,
        }
    }
}

/// Host client, completion backend and settings for a run.
///
/// The provider is selected once, here.
#[derive(Debug, Clone)]
pub struct Reviewer {
    host: GitHubClient,
    llm: CompletionProvider,
    settings: ReviewSettings,
}

impl Reviewer {
    /// # Errors
    /// Configuration errors from the host client or the provider selector.
    pub fn new(settings: ReviewSettings, llm_settings: &LlmSettings) -> MrResult<Self> {
        let host = GitHubClient::new(&settings.github)?;
        let llm = select_provider(llm_settings)?;
        Ok(Self::from_parts(host, llm, settings))
    }

    pub fn from_parts(host: GitHubClient, llm: CompletionProvider, settings: ReviewSettings) -> Self {
        Self {
            host,
            llm,
            settings,
        }
    }

    /// Runs steps 1–5 for one PR.
    ///
    /// `model` overrides the backend's default model for both completions.
    #[instrument(skip_all, fields(pr = %id))]
    pub async fn run(&self, id: &PullRequestId, model: Option<&str>) -> MrResult<ReviewOutcome> {
        let t0 = Instant::now();

        debug!("step1: fetch pull request");
        let pr = self.host.get_pull_request(id).await?;
        debug!(head_sha = %pr.head_sha, "step1: meta ok");

        debug!("step2: gate");
        let (analyze, head_sha) = gate::should_analyze(&self.host, &pr).await?;
        if !analyze {
            return Ok(ReviewOutcome::Skipped { head_sha });
        }

        debug!("step3: summarize changes");
        let files = self.host.list_files(id).await?;
        let report = summary::summarize_pull_request(&self.host, &pr, files).await;
        debug!(
            files = report.files_changed,
            additions = report.additions,
            deletions = report.deletions,
            notable = report.summary.len(),
            contents = report.file_contents.len(),
            "step3: summary ready"
        );

        debug!("step4: ai review");
        let ai = review::run_ai_review(&self.llm, &self.settings.prompts, &pr, &report, model).await;

        debug!("step5: render + publish");
        let body = publish::render_report(&report, &ai, &head_sha);
        let outcome = match publish::publish(&self.host, id, &body, self.settings.dry_run).await? {
            Published::DryRun => ReviewOutcome::DryRun {
                head_sha,
                report: body,
            },
            Published::Posted(c) => ReviewOutcome::Published {
                head_sha,
                comment_id: c.id,
                url: c.html_url,
            },
        };

        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            head_sha = %outcome.head_sha(),
            "review finished"
        );
        Ok(outcome)
    }
}

/// Builds a [`Reviewer`] and runs it once.
///
/// This is the single public entry the CLI calls.
///
/// # Errors
/// Configuration errors before any network call; host errors during the run.
pub async fn run_review(
    settings: ReviewSettings,
    llm_settings: &LlmSettings,
    id: &PullRequestId,
    model: Option<&str>,
) -> MrResult<ReviewOutcome> {
    let reviewer = Reviewer::new(settings, llm_settings)?;
    reviewer.run(id, model).await
}
