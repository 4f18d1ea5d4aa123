//! Hosted-router backend (OpenRouter).
//!
//! Forwards the conversation verbatim to `POST {base}/chat/completions` with a
//! bearer credential. Never fails towards its caller: transport/protocol errors
//! become a [`CompletionResult`] labelled `Error getting OpenRouter response`.

use std::time::Duration;

use tracing::{instrument, warn};

use crate::{
    config::OpenRouterSettings,
    conversation::{CompletionResult, Conversation, NO_RESPONSE},
    error_handler::{AiLlmError, Provider},
    services::openai_compat::ChatCompletionsClient,
};

/// Attribution headers OpenRouter uses to identify the calling app.
const ATTRIBUTION_HEADERS: &[(&str, &str)] = &[
    ("http-referer", "https://github.com/pr-diff-bot"),
    ("x-title", "PR Diff Analyzer"),
];

#[derive(Debug, Clone)]
pub struct OpenRouterService {
    chat: ChatCompletionsClient,
    default_model: String,
}

impl OpenRouterService {
    /// Builds the backend from an API key and settings.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the base URL is invalid or the client cannot be built.
    pub fn new(
        api_key: &str,
        cfg: &OpenRouterSettings,
        timeout: Duration,
    ) -> Result<Self, AiLlmError> {
        let url = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let chat = ChatCompletionsClient::new(
            Provider::OpenRouter,
            url,
            api_key,
            ATTRIBUTION_HEADERS,
            timeout,
        )?;
        Ok(Self {
            chat,
            default_model: cfg.default_model.clone(),
        })
    }

    /// Model used when the caller passes no override.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip_all, fields(provider = "openrouter"))]
    pub async fn get_completion(
        &self,
        conversation: &Conversation,
        model: Option<&str>,
    ) -> CompletionResult {
        let model = model.unwrap_or(self.default_model.as_str());
        match self.chat.chat(model, conversation).await {
            Ok(out) => CompletionResult::success(
                out.content.unwrap_or_else(|| NO_RESPONSE.to_string()),
                out.model.unwrap_or_else(|| model.to_string()),
            ),
            Err(e) => {
                warn!(error = %e, "OpenRouter completion failed");
                CompletionResult::failure(format!("Error getting OpenRouter response: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn service(base_url: String) -> OpenRouterService {
        let cfg = OpenRouterSettings {
            api_key: Some("sk-or".into()),
            base_url,
            ..OpenRouterSettings::default()
        };
        OpenRouterService::new("sk-or", &cfg, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn uses_default_model_and_echoed_id() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-or")
            .match_header("http-referer", "https://github.com/pr-diff-bot")
            .match_body(Matcher::PartialJson(json!({
                "model": "anthropic/claude-3.5-sonnet:beta"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "model": "anthropic/claude-3.5-sonnet",
                    "choices": [{"message": {"content": "LGTM"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let r = service(server.url())
            .get_completion(&Conversation::new().user("review"), None)
            .await;

        m.assert_async().await;
        assert_eq!(r.content, "LGTM");
        assert_eq!(r.model, "anthropic/claude-3.5-sonnet");
        assert!(!r.is_error());
    }

    #[tokio::test]
    async fn override_model_is_sent_and_used_as_fallback_id() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "openai/gpt-4o"})))
            .with_status(200)
            .with_body(json!({"choices": [{"message": {"content": "ok"}}]}).to_string())
            .create_async()
            .await;

        let r = service(server.url())
            .get_completion(&Conversation::new().user("x"), Some("openai/gpt-4o"))
            .await;
        assert_eq!(r.model, "openai/gpt-4o");
    }

    #[tokio::test]
    async fn empty_answer_is_placeholder_text() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let r = service(server.url())
            .get_completion(&Conversation::new().user("x"), None)
            .await;
        assert_eq!(r.content, NO_RESPONSE);
        assert!(!r.is_error());
    }

    #[tokio::test]
    async fn malformed_body_becomes_error_result() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let r = service(server.url())
            .get_completion(&Conversation::new().user("x"), None)
            .await;
        assert!(r.is_error());
        assert!(r.content.starts_with("Error getting OpenRouter response: "));
    }

    #[tokio::test]
    async fn unreachable_host_becomes_error_result() {
        // Port 9 (discard) on localhost is not served in test environments.
        let r = service("http://127.0.0.1:9".into())
            .get_completion(&Conversation::new().user("x"), None)
            .await;
        assert!(r.is_error());
        assert!(r.content.starts_with("Error getting OpenRouter response: "));
    }
}
