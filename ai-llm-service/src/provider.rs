//! Provider selection and dispatch.
//!
//! [`select_provider`] maps [`LlmSettings`] onto exactly one backend, checking
//! that backend's credentials up front. [`CompletionProvider`] then exposes the
//! single operation the rest of the application needs.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::config::LlmSettings;
//! use ai_llm_service::conversation::Conversation;
//! use ai_llm_service::provider::select_provider;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = LlmSettings::from_env()?;
//! let provider = select_provider(&settings)?;
//! let out = provider
//!     .get_completion(&Conversation::new().user("Summarize Rust ownership."), None)
//!     .await;
//! println!("[{}] {}", out.model, out.content);
//! # Ok(()) }
//! ```

use std::time::Duration;

use tracing::info;

use crate::{
    config::{LlmProvider, LlmSettings},
    conversation::{CompletionResult, Conversation},
    error_handler::{ConfigError, Result},
    services::{
        aws_sigv4::Credentials, bedrock_service::BedrockService, ollama_service::OllamaService,
        open_router_service::OpenRouterService,
    },
};

/// The configured completion backend.
#[derive(Debug, Clone)]
pub enum CompletionProvider {
    OpenRouter(OpenRouterService),
    Ollama(OllamaService),
    Bedrock(BedrockService),
}

impl CompletionProvider {
    /// Produces a reply for `conversation`.
    ///
    /// `model` overrides the backend's default model. Never fails: on error the
    /// result carries a labelled message and the `error` model id.
    pub async fn get_completion(
        &self,
        conversation: &Conversation,
        model: Option<&str>,
    ) -> CompletionResult {
        match self {
            CompletionProvider::OpenRouter(s) => s.get_completion(conversation, model).await,
            CompletionProvider::Ollama(s) => s.get_completion(conversation, model).await,
            CompletionProvider::Bedrock(s) => s.get_completion(conversation, model).await,
        }
    }

    pub fn kind(&self) -> LlmProvider {
        match self {
            CompletionProvider::OpenRouter(_) => LlmProvider::OpenRouter,
            CompletionProvider::Ollama(_) => LlmProvider::Ollama,
            CompletionProvider::Bedrock(_) => LlmProvider::Bedrock,
        }
    }

    /// Model used when no override is passed.
    pub fn default_model(&self) -> &str {
        match self {
            CompletionProvider::OpenRouter(s) => s.default_model(),
            CompletionProvider::Ollama(s) => s.default_model(),
            CompletionProvider::Bedrock(s) => s.default_model(),
        }
    }
}

/// Builds the backend named by `settings.provider`.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown name
/// - [`ConfigError::MissingVar`] when the chosen backend's credentials are absent
///   (`OPENROUTER_API_KEY`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
/// - [`AiLlmError`](crate::error_handler::AiLlmError) if the backend cannot be built
pub fn select_provider(settings: &LlmSettings) -> Result<CompletionProvider> {
    let kind: LlmProvider = settings.provider.parse()?;
    let timeout = Duration::from_secs(settings.timeout_secs);

    let provider = match kind {
        LlmProvider::OpenRouter => {
            let key = settings
                .openrouter
                .api_key
                .as_deref()
                .ok_or(ConfigError::MissingVar("OPENROUTER_API_KEY"))?;
            CompletionProvider::OpenRouter(OpenRouterService::new(
                key,
                &settings.openrouter,
                timeout,
            )?)
        }
        LlmProvider::Ollama => {
            CompletionProvider::Ollama(OllamaService::new(&settings.ollama, timeout)?)
        }
        LlmProvider::Bedrock => {
            let bedrock = &settings.bedrock;
            let creds = Credentials {
                access_key_id: bedrock
                    .access_key_id
                    .clone()
                    .ok_or(ConfigError::MissingVar("AWS_ACCESS_KEY_ID"))?,
                secret_access_key: bedrock
                    .secret_access_key
                    .clone()
                    .ok_or(ConfigError::MissingVar("AWS_SECRET_ACCESS_KEY"))?,
                session_token: bedrock.session_token.clone(),
            };
            CompletionProvider::Bedrock(BedrockService::new(creds, bedrock, timeout)?)
        }
    };

    info!(
        provider = %kind,
        default_model = provider.default_model(),
        timeout_secs = settings.timeout_secs,
        "completion provider selected"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::AiLlmError;

    fn settings(provider: &str) -> LlmSettings {
        LlmSettings {
            provider: provider.to_string(),
            ..LlmSettings::default()
        }
    }

    fn config_err(r: Result<CompletionProvider>) -> ConfigError {
        match r {
            Err(AiLlmError::Config(e)) => e,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn openrouter_requires_api_key() {
        assert_eq!(
            config_err(select_provider(&settings("openrouter"))),
            ConfigError::MissingVar("OPENROUTER_API_KEY")
        );

        let mut s = settings("openrouter");
        s.openrouter.api_key = Some("sk-or".into());
        let p = select_provider(&s).unwrap();
        assert_eq!(p.kind(), LlmProvider::OpenRouter);
        assert_eq!(p.default_model(), "anthropic/claude-3.5-sonnet:beta");
    }

    #[test]
    fn ollama_needs_no_credentials() {
        let p = select_provider(&settings("Ollama")).unwrap();
        assert_eq!(p.kind(), LlmProvider::Ollama);
        assert_eq!(p.default_model(), "deepseek-r1:1.5b");
    }

    #[test]
    fn bedrock_requires_both_keys() {
        let mut s = settings("bedrock");
        assert_eq!(
            config_err(select_provider(&s)),
            ConfigError::MissingVar("AWS_ACCESS_KEY_ID")
        );

        s.bedrock.access_key_id = Some("AKID".into());
        assert_eq!(
            config_err(select_provider(&s)),
            ConfigError::MissingVar("AWS_SECRET_ACCESS_KEY")
        );

        s.bedrock.secret_access_key = Some("secret".into());
        let p = select_provider(&s).unwrap();
        assert_eq!(p.kind(), LlmProvider::Bedrock);
        assert_eq!(p.default_model(), "anthropic.claude-3-sonnet-20240229-v1:0");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert_eq!(
            config_err(select_provider(&settings("gemini"))),
            ConfigError::UnsupportedProvider("gemini".into())
        );
    }

    #[tokio::test]
    async fn dispatches_to_selected_backend() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "hello"}}]}"#)
            .create_async()
            .await;

        let mut s = settings("openrouter");
        s.openrouter.api_key = Some("sk-or".into());
        s.openrouter.base_url = server.url();
        let p = select_provider(&s).unwrap();

        let r = p
            .get_completion(&Conversation::new().user("hi"), Some("x/y"))
            .await;
        assert_eq!(r.content, "hello");
        assert_eq!(r.model, "x/y");
    }
}
