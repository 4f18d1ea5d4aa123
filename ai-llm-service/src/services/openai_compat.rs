//! OpenAI-compatible chat-completions client.
//!
//! Shared transport for every backend that speaks
//! `POST .../chat/completions` (the hosted router and the local daemon).
//! Non-streaming only.
//!
//! Constructor validation:
//! - `chat_url` must start with http:// or https://
//! - the bearer credential must be a valid header value
//!
//! Errors are normalized via the unified types in `error_handler`; turning them
//! into a [`CompletionResult`](crate::conversation::CompletionResult) is the
//! calling backend's job.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    conversation::{Conversation, Turn},
    error_handler::{AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

/// What a chat-completions endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutput {
    /// First choice's message content; `None` if there were no choices or
    /// the content was null.
    pub content: Option<String>,
    /// Model id echoed by the upstream.
    pub model: Option<String>,
}

/// Thin client for one chat-completions URL.
///
/// Keeps a preconfigured `reqwest::Client` (timeout + default headers).
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    provider: Provider,
    url_chat: String,
    timeout: Duration,
}

impl ChatCompletionsClient {
    /// Builds a client posting to `chat_url` with `Authorization: Bearer <api_key>`.
    ///
    /// `extra_headers` are added to every request (attribution headers etc.).
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `chat_url` is not http(s)
    /// - [`ProviderErrorKind::Auth`] if the key cannot be used as a header
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(
        provider: Provider,
        chat_url: String,
        api_key: &str,
        extra_headers: &[(&'static str, &'static str)],
        timeout: Duration,
    ) -> Result<Self, AiLlmError> {
        let url = chat_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(
                ProviderError::new(provider, ProviderErrorKind::InvalidEndpoint(chat_url)).into(),
            );
        }

        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::Auth(format!("invalid API key header: {e}")),
            )
        })?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in extra_headers {
            headers.insert(*name, header::HeaderValue::from_static(*value));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        info!(
            %provider,
            url = %url,
            timeout_secs = timeout.as_secs(),
            "chat-completions client initialized"
        );

        Ok(Self {
            client,
            provider,
            url_chat: url.to_string(),
            timeout,
        })
    }

    /// Performs one **non-streaming** chat completion.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Timeout`] when the configured timeout elapses
    /// - [`ProviderErrorKind::Decode`] if the JSON cannot be parsed
    pub async fn chat(
        &self,
        model: &str,
        conversation: &Conversation,
    ) -> Result<ChatOutput, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model,
            messages: conversation.turns(),
        };

        debug!(
            provider = %self.provider,
            %model,
            turns = conversation.len(),
            "POST {}", self.url_chat
        );

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                provider = %self.provider,
                %status,
                %url,
                %snippet,
                %model,
                latency_ms = started.elapsed().as_millis(),
                "chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                self.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    provider = %self.provider,
                    error = %e,
                    %model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat/completions response"
                );
                return Err(ProviderError::new(
                    self.provider,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        info!(
            provider = %self.provider,
            %model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(ChatOutput {
            content,
            model: out.model,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AiLlmError {
        if e.is_timeout() {
            AiLlmError::Timeout(self.timeout)
        } else {
            AiLlmError::HttpTransport(e)
        }
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

/// Minimal response for `chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
