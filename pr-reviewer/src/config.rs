//! Review settings, loaded once at startup.
//!
//! Environment:
//! - `GITHUB_TOKEN` (required), `GITHUB_API_URL`, `GITHUB_TIMEOUT_SECS`
//! - `PR_REVIEW_SYSTEM_CONTENT`, `PR_REVIEW_DOCS_SYSTEM_CONTENT`
//! - `DRY_RUN`

use ai_llm_service::error_handler::{env_opt, validate_http_endpoint};

use crate::errors::{ConfigError, MrResult};

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_TIMEOUT_SECS: u64 = 30;

/// Built-in system prompt for the code-review call.
pub const DEFAULT_REVIEW_SYSTEM_PROMPT: &str = "You are a senior software engineer reviewing a pull request. Analyze the changes and provide:
1. Impact assessment on the codebase
2. Potential risks or concerns
3. Suggestions for improvement
4. Documentation updates needed
Keep the analysis concise but comprehensive.";

/// Built-in system prompt for the documentation call.
pub const DEFAULT_DOCS_SYSTEM_PROMPT: &str = "Analyze the changes and suggest documentation updates. Consider:
1. What new features or changes need documentation
2. Which existing docs need updating
3. Code examples or usage instructions needed
Provide specific suggestions for documentation changes.";

/// GitHub REST access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub token: String,
    /// API base, e.g. "https://api.github.com" or "https://ghe.example.com/api/v3"
    pub api_url: String,
    pub timeout_secs: u64,
}

impl GitHubSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: GITHUB_API_URL.to_string(),
            timeout_secs: GITHUB_TIMEOUT_SECS,
        }
    }
}

/// System prompts for the two completion calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub review_system: String,
    pub docs_system: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            review_system: DEFAULT_REVIEW_SYSTEM_PROMPT.to_string(),
            docs_system: DEFAULT_DOCS_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    pub github: GitHubSettings,
    pub prompts: PromptSettings,
    /// If true, render the report but do not post it.
    pub dry_run: bool,
}

impl ReviewSettings {
    /// Reads the review configuration from the process environment.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] when `GITHUB_TOKEN` is absent
    /// - [`ConfigError::InvalidBaseUrl`] for a non-http(s) `GITHUB_API_URL`
    /// - [`ConfigError::InvalidNumber`] for an unparsable `GITHUB_TIMEOUT_SECS`
    pub fn from_env() -> MrResult<Self> {
        let token = env_opt("GITHUB_TOKEN").ok_or(ConfigError::MissingVar("GITHUB_TOKEN"))?;

        let api_url = env_opt("GITHUB_API_URL").unwrap_or_else(|| GITHUB_API_URL.to_string());
        check_base_url(&api_url)?;

        let timeout_secs = match env_opt("GITHUB_TIMEOUT_SECS") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidNumber {
                var: "GITHUB_TIMEOUT_SECS",
                value: v.clone(),
            })?,
            None => GITHUB_TIMEOUT_SECS,
        };

        let defaults = PromptSettings::default();
        let prompts = PromptSettings {
            review_system: env_opt("PR_REVIEW_SYSTEM_CONTENT").unwrap_or(defaults.review_system),
            docs_system: env_opt("PR_REVIEW_DOCS_SYSTEM_CONTENT").unwrap_or(defaults.docs_system),
        };

        Ok(Self {
            github: GitHubSettings {
                token,
                api_url: api_url.trim_end_matches('/').to_string(),
                timeout_secs,
            },
            prompts,
            dry_run: env_bool("DRY_RUN", false),
        })
    }
}

/// Rejects API bases without an http(s) scheme.
pub(crate) fn check_base_url(api_url: &str) -> Result<(), ConfigError> {
    validate_http_endpoint("GITHUB_API_URL", api_url)
        .map_err(|_| ConfigError::InvalidBaseUrl(api_url.to_string()))
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
