//! Local-daemon backend (Ollama).
//!
//! Talks to the daemon through two surfaces:
//! - `POST {endpoint}/v1/chat/completions`: OpenAI-compatible chat (placeholder bearer)
//! - `POST {endpoint}/api/show` / `POST {endpoint}/api/pull`: model provisioning
//!
//! Before every completion the target model is checked with `/api/show`; a 404
//! triggers a blocking `/api/pull` whose NDJSON progress stream is consumed to
//! the end. Provisioning failures are only warnings: if the model never shows
//! up, the completion itself fails and says so.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use ai_llm_service::config::OllamaSettings;
//! use ai_llm_service::conversation::Conversation;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = OllamaService::new(&OllamaSettings::default(), Duration::from_secs(120))?;
//! let conv = Conversation::new().user("Write a haiku about Rust.");
//! let out = svc.get_completion(&conv, Some("qwen3:14b")).await;
//! println!("{} said:\n{}", out.model, out.content);
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::OllamaSettings,
    conversation::{CompletionResult, Conversation, NO_RESPONSE},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
        validate_http_endpoint,
    },
    services::openai_compat::ChatCompletionsClient,
};

/// The daemon does not authenticate, but the chat protocol wants a key.
const PLACEHOLDER_API_KEY: &str = "ollama";

/// Prefix of model ids served by the local daemon.
pub const LOCAL_MODEL_PREFIX: &str = "local/";

/// Fragment of the daemon's error text when a model is absent.
const MODEL_NOT_FOUND_PATTERN: &str = "not found, try pulling it first";

/// Operator guidance returned when the daemon reports a missing model.
pub fn model_not_found_message(model: &str) -> String {
    format!("Model not found. Please run 'ollama pull {model}' first to download the model.")
}

/// Result of the availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// `/api/show` found the model.
    AlreadyPresent,
    /// The model was missing and a pull stream ran to completion.
    Pulled,
}

/// Thin client for a local Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaService {
    client: reqwest::Client,
    chat: ChatCompletionsClient,
    cfg: OllamaSettings,
    timeout: Duration,
    url_show: String,
    url_pull: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given settings.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFormat`](crate::error_handler::ConfigError::InvalidFormat)
    ///   if `cfg.base_url` is not http(s)
    /// - [`AiLlmError::HttpTransport`] if an HTTP client cannot be built
    pub fn new(cfg: &OllamaSettings, timeout: Duration) -> Result<Self, AiLlmError> {
        let base = cfg.base_url.trim().trim_end_matches('/').to_string();
        validate_http_endpoint("OLLAMA_BASE_URL", &base)?;

        let chat = ChatCompletionsClient::new(
            Provider::Ollama,
            format!("{base}/v1/chat/completions"),
            PLACEHOLDER_API_KEY,
            &[],
            timeout,
        )?;

        // Per-request timeouts: a pull may legitimately take much longer than a probe.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            chat,
            cfg: cfg.clone(),
            timeout,
            url_show: format!("{base}/api/show"),
            url_pull: format!("{base}/api/pull"),
        })
    }

    /// Model used when the caller passes no override.
    pub fn default_model(&self) -> &str {
        &self.cfg.default_model
    }

    /// Runs one completion, provisioning the model first if needed.
    ///
    /// Never fails: errors come back as a [`CompletionResult`] with the error
    /// sentinel as model id.
    #[instrument(skip_all, fields(provider = "ollama"))]
    pub async fn get_completion(
        &self,
        conversation: &Conversation,
        model: Option<&str>,
    ) -> CompletionResult {
        let model = model.unwrap_or(self.cfg.default_model.as_str());

        self.ensure_model_pulled(model).await;

        match self.chat.chat(model, conversation).await {
            Ok(out) => CompletionResult::success(
                out.content.unwrap_or_else(|| NO_RESPONSE.to_string()),
                format!("{LOCAL_MODEL_PREFIX}{model}"),
            ),
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, %model, "Ollama completion failed");
                if msg.contains(MODEL_NOT_FOUND_PATTERN) {
                    CompletionResult::failure(model_not_found_message(model))
                } else {
                    CompletionResult::failure(format!("Error getting Ollama response: {msg}"))
                }
            }
        }
    }

    /// Best-effort provisioning: any failure is logged and swallowed.
    pub async fn ensure_model_pulled(&self, model: &str) -> Option<Provisioning> {
        match self.try_ensure_model(model).await {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, %model, "could not provision model; continuing");
                None
            }
        }
    }

    /// Checks `/api/show` and pulls the model on 404.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for unexpected statuses on show/pull
    /// - [`ProviderErrorKind::Decode`] if the pull stream reports an error
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    pub async fn try_ensure_model(&self, model: &str) -> Result<Provisioning, AiLlmError> {
        debug!("POST {}", self.url_show);
        let resp = self
            .client
            .post(&self.url_show)
            .timeout(self.timeout)
            .json(&ModelRequest { name: model })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {
                debug!(%model, "model already available");
                Ok(Provisioning::AlreadyPresent)
            }
            StatusCode::NOT_FOUND => {
                info!(%model, "pulling model... this may take a while");
                self.pull_model(model).await?;
                Ok(Provisioning::Pulled)
            }
            status => Err(self.http_error(status, &self.url_show, resp).await),
        }
    }

    /// Streams `/api/pull` until the daemon closes the response.
    async fn pull_model(&self, model: &str) -> Result<(), AiLlmError> {
        let started = Instant::now();
        let mut req = self
            .client
            .post(&self.url_pull)
            .json(&ModelRequest { name: model });
        if let Some(secs) = self.cfg.pull_timeout_secs {
            req = req.timeout(Duration::from_secs(secs));
        }

        let mut resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(self.http_error(status, &self.url_pull, resp).await);
        }

        let mut progress = PullTracker::default();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            buf.extend_from_slice(&chunk);
            while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                progress.feed(&line)?;
            }
        }
        progress.feed(&buf)?;

        info!(
            %model,
            last_status = progress.last_status.as_deref().unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis(),
            "model pulled"
        );
        Ok(())
    }

    async fn http_error(
        &self,
        status: StatusCode,
        url: &str,
        resp: reqwest::Response,
    ) -> AiLlmError {
        let text = resp.text().await.unwrap_or_default();
        ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet: make_snippet(&text),
            }),
        )
        .into()
    }
}

/// Follows the NDJSON progress lines of `/api/pull`.
#[derive(Debug, Default)]
struct PullTracker {
    last_status: Option<String>,
}

impl PullTracker {
    fn feed(&mut self, raw: &[u8]) -> Result<(), AiLlmError> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        // Unknown shapes are progress noise, not failures.
        let Ok(p) = serde_json::from_str::<PullProgress>(line) else {
            debug!(line = %make_snippet(line), "unparsed pull progress line");
            return Ok(());
        };

        if let Some(err) = p.error {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::Decode(err)).into(),
            );
        }

        if let Some(status) = p.status {
            if let Some(percent) = percent(p.completed, p.total) {
                debug!(%status, percent, "pull progress");
            }
            if self.last_status.as_deref() != Some(status.as_str()) {
                info!(%status, "pull status");
                self.last_status = Some(status);
            }
        }
        Ok(())
    }
}

fn percent(completed: Option<u64>, total: Option<u64>) -> Option<u64> {
    match (completed, total) {
        (Some(done), Some(total)) if total > 0 => Some(done.saturating_mul(100) / total),
        _ => None,
    }
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/api/show` and `/api/pull`.
#[derive(Debug, Serialize)]
struct ModelRequest<'a> {
    name: &'a str,
}

/// One NDJSON line of the `/api/pull` stream.
#[derive(Debug, Deserialize)]
struct PullProgress {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}
