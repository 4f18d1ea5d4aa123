use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the backend used for chat completions.
///
/// The set is closed: the selector maps a configured name onto one of these
/// variants or fails with [`ConfigError::UnsupportedProvider`].
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "Ollama".parse().unwrap();
/// assert_eq!(p, LlmProvider::Ollama);
/// assert_eq!(p.as_str(), "ollama");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LlmProvider {
    /// Hosted OpenAI-compatible router (OpenRouter).
    #[default]
    OpenRouter,
    /// Local Ollama daemon.
    Ollama,
    /// AWS Bedrock runtime.
    Bedrock,
}

impl LlmProvider {
    /// Configuration name of the provider (`LLM_PROVIDER` value).
    pub fn as_str(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "openrouter",
            LlmProvider::Ollama => "ollama",
            LlmProvider::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "ollama" => Ok(LlmProvider::Ollama),
            "bedrock" => Ok(LlmProvider::Bedrock),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("OpenRouter".parse::<LlmProvider>(), Ok(LlmProvider::OpenRouter));
        assert_eq!(" BEDROCK ".parse::<LlmProvider>(), Ok(LlmProvider::Bedrock));
    }

    #[test]
    fn unknown_name_is_unsupported() {
        assert_eq!(
            "anthropic".parse::<LlmProvider>(),
            Err(ConfigError::UnsupportedProvider("anthropic".into()))
        );
    }
}
