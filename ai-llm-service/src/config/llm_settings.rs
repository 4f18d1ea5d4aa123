//! Explicit LLM configuration, populated once at startup.
//!
//! Nothing here reads the environment; see [`default_config`](super::default_config)
//! for the env-backed constructor. Credentials are kept optional so that the
//! selector, not the loader, decides which ones are mandatory.

/// Default OpenRouter API base.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Model used by the hosted router when the caller does not override it.
pub const OPENROUTER_DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet:beta";

/// Default local daemon endpoint.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
/// Fallback daemon model when `OLLAMA_MODEL` is not configured.
pub const OLLAMA_DEFAULT_MODEL: &str = "deepseek-r1:1.5b";

/// Default AWS region for the Bedrock runtime.
pub const BEDROCK_DEFAULT_REGION: &str = "us-east-1";

/// Completion request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Hosted router (OpenRouter) settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRouterSettings {
    /// Bearer credential; mandatory when this backend is selected.
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENROUTER_BASE_URL.to_string(),
            default_model: OPENROUTER_DEFAULT_MODEL.to_string(),
        }
    }
}

/// Local daemon (Ollama) settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub base_url: String,
    pub default_model: String,
    /// Upper bound for a model pull; `None` waits until the stream ends.
    pub pull_timeout_secs: Option<u64>,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: OLLAMA_BASE_URL.to_string(),
            default_model: OLLAMA_DEFAULT_MODEL.to_string(),
            pull_timeout_secs: None,
        }
    }
}

/// Managed cloud (AWS Bedrock runtime) settings.
///
/// Carries no model: Bedrock model ids are versioned and passed per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedrockSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: String,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`.
    pub endpoint: Option<String>,
}

impl Default for BedrockSettings {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            region: BEDROCK_DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }
}

impl BedrockSettings {
    /// Runtime endpoint for the configured region (or the override).
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(ep) => ep.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

/// Complete LLM configuration.
///
/// `provider` keeps the raw selector text so an unknown value can be reported
/// verbatim by [`select_provider`](crate::provider::select_provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub openrouter: OpenRouterSettings,
    pub ollama: OllamaSettings,
    pub bedrock: BedrockSettings,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            openrouter: OpenRouterSettings::default(),
            ollama: OllamaSettings::default(),
            bedrock: BedrockSettings::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bedrock_endpoint_follows_region() {
        let cfg = BedrockSettings {
            region: "eu-west-1".into(),
            ..BedrockSettings::default()
        };
        assert_eq!(cfg.endpoint(), "https://bedrock-runtime.eu-west-1.amazonaws.com");
    }

    #[test]
    fn bedrock_endpoint_override_wins() {
        let cfg = BedrockSettings {
            endpoint: Some("http://127.0.0.1:9000/".into()),
            ..BedrockSettings::default()
        };
        assert_eq!(cfg.endpoint(), "http://127.0.0.1:9000");
    }
}
