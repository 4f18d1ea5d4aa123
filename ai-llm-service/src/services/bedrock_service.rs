//! Managed-cloud backend (AWS Bedrock runtime, Anthropic messages format).
//!
//! `POST {endpoint}/model/{modelId}/invoke`, signed with SigV4 for the
//! `bedrock` service. Turns are forwarded exactly as given, including system
//! turns.

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::{Url, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::BedrockSettings,
    conversation::{CompletionResult, Conversation, NO_RESPONSE, Turn},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    services::aws_sigv4::{Credentials, SigV4Signer, SignableRequest},
};

/// Model invoked when the caller passes no override.
pub const BEDROCK_DEFAULT_MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.5;
const SIGNING_SERVICE: &str = "bedrock";

#[derive(Debug, Clone)]
pub struct BedrockService {
    client: reqwest::Client,
    signer: SigV4Signer,
    endpoint: String,
    timeout: Duration,
}

impl BedrockService {
    /// # Errors
    /// - [`ProviderErrorKind::InvalidEndpoint`] if the runtime endpoint is not a URL
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(
        creds: Credentials,
        cfg: &BedrockSettings,
        timeout: Duration,
    ) -> Result<Self, AiLlmError> {
        let endpoint = cfg.endpoint();
        if Url::parse(&endpoint).is_err() {
            return Err(
                ProviderError::new(Provider::Bedrock, ProviderErrorKind::InvalidEndpoint(endpoint))
                    .into(),
            );
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(%endpoint, region = %cfg.region, "bedrock runtime client initialized");

        Ok(Self {
            client,
            signer: SigV4Signer::new(creds, cfg.region.clone(), SIGNING_SERVICE),
            endpoint,
            timeout,
        })
    }

    pub fn default_model(&self) -> &str {
        BEDROCK_DEFAULT_MODEL
    }

    #[instrument(skip_all, fields(provider = "bedrock"))]
    pub async fn get_completion(
        &self,
        conversation: &Conversation,
        model: Option<&str>,
    ) -> CompletionResult {
        let model = model.unwrap_or(BEDROCK_DEFAULT_MODEL);
        debug!(%model, prompt = %conversation.flatten(), "bedrock prompt");

        match self.invoke(model, conversation).await {
            Ok(text) => CompletionResult::success(
                text.unwrap_or_else(|| NO_RESPONSE.to_string()),
                model,
            ),
            Err(e) => {
                warn!(error = %e, %model, "Bedrock completion failed");
                CompletionResult::failure(format!("Error getting Bedrock response: {e}"))
            }
        }
    }

    /// One signed `invoke` call; returns the first content block's text.
    async fn invoke(
        &self,
        model: &str,
        conversation: &Conversation,
    ) -> Result<Option<String>, AiLlmError> {
        let started = Instant::now();
        let url = self.invoke_url(model)?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(ProviderError::new(
                    Provider::Bedrock,
                    ProviderErrorKind::InvalidEndpoint(url.to_string()),
                )
                .into());
            }
        };

        let body = serde_json::to_vec(&InvokeRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: MAX_TOKENS,
            messages: conversation.turns(),
            temperature: TEMPERATURE,
        })
        .map_err(|e| ProviderError::new(Provider::Bedrock, ProviderErrorKind::Decode(e.to_string())))?;

        let signed = self.signer.sign(
            &SignableRequest {
                method: "POST",
                path: url.path(),
                query: "",
                headers: &[("content-type", "application/json"), ("host", host.as_str())],
                payload: &body,
            },
            Utc::now(),
        );

        debug!(%model, "POST {url}");
        let mut req = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header("x-amz-date", &signed.x_amz_date)
            .header(header::AUTHORIZATION, &signed.authorization);
        if let Some(token) = &signed.x_amz_security_token {
            req = req.header("x-amz-security-token", token);
        }

        let resp = req.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                AiLlmError::Timeout(self.timeout)
            } else {
                AiLlmError::HttpTransport(e)
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                %snippet,
                %model,
                latency_ms = started.elapsed().as_millis(),
                "bedrock invoke returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Bedrock,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        let out: InvokeResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Bedrock,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `content[0].text`")),
            )
        })?;

        info!(
            %model,
            latency_ms = started.elapsed().as_millis(),
            "bedrock invoke completed"
        );

        Ok(out.content.into_iter().next().and_then(|b| b.text))
    }

    fn invoke_url(&self, model: &str) -> Result<Url, AiLlmError> {
        let raw = format!("{}/model/{}/invoke", self.endpoint, urlencoding::encode(model));
        Url::parse(&raw).map_err(|_| {
            ProviderError::new(Provider::Bedrock, ProviderErrorKind::InvalidEndpoint(raw)).into()
        })
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    messages: &'a [Turn],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn service(endpoint: String, token: Option<&str>) -> BedrockService {
        let cfg = BedrockSettings {
            region: "us-west-2".into(),
            endpoint: Some(endpoint),
            ..BedrockSettings::default()
        };
        let creds = Credentials {
            access_key_id: "AKIDTEST".into(),
            secret_access_key: "secret".into(),
            session_token: token.map(str::to_string),
        };
        BedrockService::new(creds, &cfg, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn signed_invoke_of_default_model() {
        let mut server = Server::new_async().await;
        let m = server
            .mock(
                "POST",
                "/model/anthropic.claude-3-sonnet-20240229-v1%3A0/invoke",
            )
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^AWS4-HMAC-SHA256 Credential=AKIDTEST/\d{8}/us-west-2/bedrock/aws4_request, SignedHeaders=content-type;host;x-amz-date, Signature=[0-9a-f]{64}$"
                        .into(),
                ),
            )
            .match_header("x-amz-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".into()))
            .match_body(Matcher::Json(json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 4096,
                "temperature": 0.5,
                "messages": [
                    {"role": "system", "content": "be terse"},
                    {"role": "user", "content": "review"}
                ]
            })))
            .with_status(200)
            .with_body(json!({"content": [{"type": "text", "text": "Looks fine."}]}).to_string())
            .create_async()
            .await;

        let conv = Conversation::new().system("be terse").user("review");
        let r = service(server.url(), None).get_completion(&conv, None).await;

        m.assert_async().await;
        assert_eq!(r.content, "Looks fine.");
        assert_eq!(r.model, BEDROCK_DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn session_token_is_forwarded() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/model/m1/invoke")
            .match_header("x-amz-security-token", "sess")
            .match_header(
                "authorization",
                Matcher::Regex("SignedHeaders=content-type;host;x-amz-date;x-amz-security-token".into()),
            )
            .with_status(200)
            .with_body(r#"{"content": [{"text": "ok"}]}"#)
            .create_async()
            .await;

        let r = service(server.url(), Some("sess"))
            .get_completion(&Conversation::new().user("x"), Some("m1"))
            .await;
        m.assert_async().await;
        assert_eq!(r.model, "m1");
    }

    #[tokio::test]
    async fn empty_content_is_placeholder() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/model/m1/invoke")
            .with_status(200)
            .with_body(r#"{"content": []}"#)
            .create_async()
            .await;

        let r = service(server.url(), None)
            .get_completion(&Conversation::new().user("x"), Some("m1"))
            .await;
        assert!(!r.is_error());
        assert_eq!(r.content, NO_RESPONSE);
    }

    #[tokio::test]
    async fn rejected_request_becomes_error_result() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/model/m1/invoke")
            .with_status(403)
            .with_body(r#"{"message": "The security token included in the request is invalid."}"#)
            .create_async()
            .await;

        let r = service(server.url(), None)
            .get_completion(&Conversation::new().user("x"), Some("m1"))
            .await;
        assert!(r.is_error());
        assert!(r.content.starts_with("Error getting Bedrock response: "));
        assert!(r.content.contains("security token"));
    }

    #[tokio::test]
    async fn malformed_body_becomes_error_result() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/model/m1/invoke")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let r = service(server.url(), None)
            .get_completion(&Conversation::new().user("x"), Some("m1"))
            .await;
        assert!(r.is_error());
        assert!(r.content.starts_with("Error getting Bedrock response: "));
        assert!(r.content.contains("decode error"), "{}", r.content);
    }

    #[tokio::test]
    async fn unreachable_endpoint_becomes_error_result() {
        let r = service("http://127.0.0.1:9".into(), None)
            .get_completion(&Conversation::new().user("x"), None)
            .await;
        assert!(r.is_error());
        assert!(r.content.starts_with("Error getting Bedrock response: "));
    }
}
