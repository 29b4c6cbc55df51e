//! Anthropic Messages client used by AI text import.
//!
//! Model, token limit and timeout come from [`LlmSettings`]. Rate limits and
//! server errors are retried with exponential backoff; other failures are
//! returned on the first attempt.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned no text content")]
    EmptyContent,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Per-request timeout, retries not included.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    endpoint: String,
    settings: LlmSettings,
    retry_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, settings: LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            http: Client::builder().timeout(settings.timeout).build()?,
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
            settings,
            retry_base: RETRY_BASE,
        })
    }

    /// Sends one user turn and returns the first text block of the reply.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.send(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < MAX_ATTEMPTS && is_transient(&e) => e,
                Err(e) => return Err(e),
            };

            let delay = backoff(self.retry_base, attempt);
            warn!(
                "LLM attempt {attempt}/{MAX_ATTEMPTS} failed ({failure}); retrying in {}ms",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Like [`complete`](Self::complete) but decodes the reply as JSON,
    /// tolerating a surrounding code fence.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.complete(prompt, system).await?;
        Ok(serde_json::from_str(strip_json_fences(&text))?)
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: MessagesResponse = response.json().await?;
        let text = reply
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .ok_or(LlmError::EmptyContent)?;
        debug!("LLM reply: {} chars", text.len());
        Ok(text)
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String, retry_base: Duration) -> Self {
        self.endpoint = endpoint;
        self.retry_base = retry_base;
        self
    }
}

/// Rate limits and server-side failures are worth another attempt.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(error: &LlmError) -> bool {
    match error {
        LlmError::Api { status, .. } => StatusCode::from_u16(*status).map_or(false, is_retryable),
        LlmError::Http(e) => e.is_timeout() || e.is_connect(),
        LlmError::Parse(_) | LlmError::EmptyContent => false,
    }
}

/// base, 2·base, 4·base, ...
fn backoff(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone)]
    struct Script {
        statuses: Arc<Vec<u16>>,
        hits: Arc<AtomicUsize>,
    }

    /// Answers with the scripted status for each hit, then 200 once the script runs out.
    async fn scripted(State(script): State<Script>) -> Response {
        let n = script.hits.fetch_add(1, Ordering::SeqCst);
        let code = script.statuses.get(n).copied().unwrap_or(200);
        let status = axum::http::StatusCode::from_u16(code).unwrap();
        if status.is_success() {
            let reply = json!({ "content": [{ "type": "text", "text": "```json\n{\"ok\": true}\n```" }] });
            (status, Json(reply)).into_response()
        } else {
            let reply = json!({ "error": { "type": "scripted", "message": format!("status {code}") } });
            (status, Json(reply)).into_response()
        }
    }

    async fn client_against(statuses: &[u16]) -> (LlmClient, Arc<AtomicUsize>) {
        let script = Script {
            statuses: Arc::new(statuses.to_vec()),
            hits: Arc::new(AtomicUsize::new(0)),
        };
        let hits = script.hits.clone();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/v1/messages", post(scripted))
            .with_state(script);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let settings = LlmSettings {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        };
        let client = LlmClient::new("test-key".to_string(), settings)
            .unwrap()
            .with_endpoint(format!("http://{addr}/v1/messages"), Duration::from_millis(1));
        (client, hits)
    }

    #[test]
    fn test_retry_classification() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));

        let bad_request = LlmError::Api {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(!is_transient(&bad_request));
        assert!(!is_transient(&LlmError::EmptyContent));
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 1), Duration::from_millis(500));
        assert_eq!(backoff(base, 2), Duration::from_secs(1));
        assert_eq!(backoff(base, 3), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_rate_limit_and_server_errors_are_retried() {
        let (client, hits) = client_against(&[429, 503]).await;
        let reply: Value = client.call_json("prompt", "system").await.unwrap();
        assert_eq!(reply["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_returned_without_retry() {
        let (client, hits) = client_against(&[400]).await;
        let err = client.complete("prompt", "system").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "status 400");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (client, hits) = client_against(&[500, 500, 500, 500]).await;
        let err = client.complete("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"skills\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"skills\": []}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"skills\": []}\n";
        assert_eq!(strip_json_fences(input), "{\"skills\": []}");
    }
}
