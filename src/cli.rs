use clap::Parser;

/// Analyze a GitHub pull request and post an AI review comment.
#[derive(Debug, Parser)]
#[command(name = "pr-diff-bot", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Repository in `owner/repo` form.
    #[arg(long)]
    pub repo: String,

    /// Pull request number.
    #[arg(long)]
    pub pr: u64,

    /// Completion backend; overrides `LLM_PROVIDER`.
    #[arg(long, value_parser = ["openrouter", "ollama", "bedrock"], ignore_case = true)]
    pub provider: Option<String>,

    /// Model id forwarded to both completion calls.
    #[arg(long)]
    pub model: Option<String>,

    /// Render the report to stdout instead of posting it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
