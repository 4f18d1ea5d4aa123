//! AI review: two completion calls over the summarized changes.
//!
//! 1) code review (system prompt + full context with patches)
//! 2) documentation suggestions (docs prompt + condensed context)
//!
//! Neither call can fail: errors come back inside the [`CompletionResult`] and
//! end up in the rendered report.

pub mod prompt;

use std::time::Instant;

use ai_llm_service::{CompletionProvider, CompletionResult};
use tracing::{info, warn};

use crate::config::PromptSettings;
use crate::git_providers::PullRequest;
use crate::summary::AnalysisReport;
use prompt::{build_docs_conversation, build_review_conversation};

/// Both model answers for one PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReview {
    pub analysis: CompletionResult,
    pub docs: CompletionResult,
}

/// Runs the review call, then the documentation call.
pub async fn run_ai_review(
    llm: &CompletionProvider,
    prompts: &PromptSettings,
    pr: &PullRequest,
    report: &AnalysisReport,
    model: Option<&str>,
) -> AiReview {
    let t0 = Instant::now();
    let review_conv = build_review_conversation(&prompts.review_system, pr, report);
    let analysis = llm.get_completion(&review_conv, model).await;
    if analysis.is_error() {
        warn!(pr = %pr.id, "code review completion failed; error goes into the report");
    }

    let docs_conv = build_docs_conversation(&prompts.docs_system, pr, report);
    let docs = llm.get_completion(&docs_conv, model).await;
    if docs.is_error() {
        warn!(pr = %pr.id, "documentation completion failed; error goes into the report");
    }

    info!(
        pr = %pr.id,
        provider = %llm.kind(),
        model = %analysis.model,
        elapsed_ms = t0.elapsed().as_millis(),
        "ai review done"
    );

    AiReview { analysis, docs }
}
