mod cli;

use ai_llm_service::config::LlmSettings;
use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use pr_reviewer::{ReviewOutcome, config::ReviewSettings, git_providers::PullRequestId, run_review};
use tracing::{error, info};

use cli::Cli;

fn main() {
    // .env is optional
    dotenvy::dotenv().ok();

    if let Err(e) = ai_llm_service::telemetry::init("info") {
        eprintln!("failed to init logging: {e}");
    }

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %format!("{e:#}"), "pr-diff-bot failed");
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut llm_settings = LlmSettings::from_env().context("loading LLM configuration")?;
    if let Some(p) = cli.provider {
        llm_settings.provider = p;
    }

    let mut settings = ReviewSettings::from_env().context("loading review configuration")?;
    settings.dry_run |= cli.dry_run;

    let id = PullRequestId::parse(&cli.repo, cli.pr)?;

    info!(
        pr = %id,
        provider = %llm_settings.provider,
        model = cli.model.as_deref().unwrap_or("default"),
        dry_run = settings.dry_run,
        "starting analysis"
    );
    info!(prompt = %settings.prompts.review_system, "review system prompt");
    info!(prompt = %settings.prompts.docs_system, "docs system prompt");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let outcome = rt
        .block_on(run_review(settings, &llm_settings, &id, cli.model.as_deref()))
        .with_context(|| format!("reviewing {id}"))?;

    match outcome {
        ReviewOutcome::Skipped { head_sha } => {
            info!(pr = %id, %head_sha, "commit already analyzed, skipping");
        }
        ReviewOutcome::DryRun { report, .. } => {
            let rule = "=".repeat(80);
            println!("{}", rule.yellow());
            println!("{}", "DRY RUN: Would post the following comment:".yellow().bold());
            println!("{}", rule.yellow());
            println!("{report}");
            println!("{}", rule.yellow());
        }
        ReviewOutcome::Published { comment_id, url, .. } => {
            info!(pr = %id, comment_id, %url, "review comment created");
        }
    }
    Ok(())
}
