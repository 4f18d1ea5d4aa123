//! Crate-wide error hierarchy for pr-reviewer.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Host-aware mapping (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).
//! - Completion failures never show up here: backends encode them in the
//!   result content. Only LLM *setup* errors (selector) do.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type MrResult<T> = Result<T, Error>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Source-control host (GitHub) failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration problems (missing token, bad base URL, bad numbers).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// LLM configuration or backend construction failure.
    #[error(transparent)]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Input validation errors (bad repository identifier, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Detailed host-specific error used inside the git provider layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of host response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Configuration and setup errors for the host client and review settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingVar(&'static str),

    #[error("GITHUB_TOKEN is not a valid header value")]
    InvalidToken,

    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid number in {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(ProviderError::from(e))
    }
}

impl From<ai_llm_service::ConfigError> for Error {
    fn from(e: ai_llm_service::ConfigError) -> Self {
        Error::Llm(e.into())
    }
}

impl ProviderError {
    /// Maps a non-success HTTP status onto the error taxonomy.
    pub fn from_status(code: u16, retry_after_secs: Option<u64>) -> Self {
        match code {
            401 => ProviderError::Unauthorized,
            403 => ProviderError::Forbidden,
            404 => ProviderError::NotFound,
            429 => ProviderError::RateLimited { retry_after_secs },
            500..=599 => ProviderError::Server(code),
            _ => ProviderError::HttpStatus(code),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return ProviderError::from_status(status.as_u16(), None);
        }
        if e.is_decode() {
            return ProviderError::InvalidResponse(e.to_string());
        }
        ProviderError::Network(e.to_string())
    }
}
