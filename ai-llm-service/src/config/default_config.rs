//! Env-backed constructor for [`LlmSettings`].
//!
//! Read once at startup; the resulting struct is passed by reference into the
//! selector. Missing credentials are *not* errors here, only malformed values
//! are (bad numbers, bad URL schemes).
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`      = `openrouter` (default) | `ollama` | `bedrock`
//! - `LLM_TIMEOUT_SECS`  = per-request completion timeout (default 300)
//!
//! OpenRouter:
//! - `OPENROUTER_API_KEY`
//! - `OPENROUTER_BASE_URL` (default `https://openrouter.ai/api/v1`)
//!
//! Ollama:
//! - `OLLAMA_BASE_URL` (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`    (default `deepseek-r1:1.5b`)
//! - `OLLAMA_PULL_TIMEOUT_SECS` (unset = wait for the pull to finish)
//!
//! Bedrock:
//! - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`
//! - `AWS_REGION` (default `us-east-1`)
//! - `BEDROCK_ENDPOINT_URL`

use crate::{
    config::llm_settings::{
        BedrockSettings, DEFAULT_TIMEOUT_SECS, LlmSettings, OllamaSettings, OpenRouterSettings,
    },
    error_handler::{Result, env_opt, env_opt_u64, validate_http_endpoint},
};

impl LlmSettings {
    /// Loads the LLM configuration from the process environment.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidNumber`](crate::error_handler::ConfigError::InvalidNumber)
    ///   for unparsable timeouts
    /// - [`ConfigError::InvalidFormat`](crate::error_handler::ConfigError::InvalidFormat)
    ///   for endpoints without an http(s) scheme
    pub fn from_env() -> Result<Self> {
        let defaults = LlmSettings::default();

        let provider = env_opt("LLM_PROVIDER").unwrap_or(defaults.provider);
        let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let openrouter = OpenRouterSettings {
            api_key: env_opt("OPENROUTER_API_KEY"),
            base_url: env_opt("OPENROUTER_BASE_URL").unwrap_or(defaults.openrouter.base_url),
            default_model: defaults.openrouter.default_model,
        };
        validate_http_endpoint("OPENROUTER_BASE_URL", &openrouter.base_url)?;

        let ollama = OllamaSettings {
            base_url: env_opt("OLLAMA_BASE_URL").unwrap_or(defaults.ollama.base_url),
            default_model: env_opt("OLLAMA_MODEL").unwrap_or(defaults.ollama.default_model),
            pull_timeout_secs: env_opt_u64("OLLAMA_PULL_TIMEOUT_SECS")?,
        };
        validate_http_endpoint("OLLAMA_BASE_URL", &ollama.base_url)?;

        let bedrock = BedrockSettings {
            access_key_id: env_opt("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_opt("AWS_SECRET_ACCESS_KEY"),
            session_token: env_opt("AWS_SESSION_TOKEN"),
            region: env_opt("AWS_REGION").unwrap_or(defaults.bedrock.region),
            endpoint: env_opt("BEDROCK_ENDPOINT_URL"),
        };
        if let Some(ep) = &bedrock.endpoint {
            validate_http_endpoint("BEDROCK_ENDPOINT_URL", ep)?;
        }

        Ok(Self {
            provider,
            openrouter,
            ollama,
            bedrock,
            timeout_secs,
        })
    }
}
