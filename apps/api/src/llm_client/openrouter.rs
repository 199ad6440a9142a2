//! Remote transport: OpenRouter chat completions.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{http_client, ProviderTransport, RawOutput, TransportError};
use crate::evaluation::prompts::InstructionPayload;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
/// Upper bound on the model's answer length.
pub const MAX_TOKENS: u32 = 2000;
const APP_TITLE: &str = "ATS Resume Scorer";

lazy_static! {
    /// Upstream wording that indicates a rejected credential, matched on lower-cased text.
    static ref AUTH_FAILURE_MARKERS: Regex =
        Regex::new(r"clerk|auth|authenticate|invalid\s*api\s*key|unauthoriz")
            .expect("Invalid regex");
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
    }
}

pub struct OpenRouterTransport {
    client: Client,
    endpoint: String,
    site_url: Option<Url>,
}

impl OpenRouterTransport {
    pub fn new(endpoint: String, site_url: Option<Url>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            site_url,
        })
    }
}

#[async_trait]
impl ProviderTransport for OpenRouterTransport {
    async fn send(
        &self,
        payload: &InstructionPayload,
        model: &str,
        credential: Option<&SecretString>,
    ) -> Result<RawOutput, TransportError> {
        let credential = credential.ok_or(TransportError::MissingCredential)?;

        let request_body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &payload.system,
                },
                ChatMessage {
                    role: "user",
                    content: &payload.user,
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose_secret())
            .header("content-type", "application/json; charset=utf-8")
            .header("x-title", APP_TITLE)
            .json(&request_body);
        if let Some(site_url) = &self.site_url {
            request = request.header("http-referer", site_url.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_request("OpenRouter", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenRouter API error ({status}): {body}");
            return Err(classify_failure(status.as_u16(), &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::from_request("OpenRouter", e))?;
        let content = chat.into_content().ok_or(TransportError::EmptyResponse)?;

        debug!("OpenRouter call succeeded: model={model}, chars={}", content.len());

        Ok(RawOutput {
            content,
            status: status.as_u16(),
        })
    }
}

/// Sorts a non-success response into "bad credential" or "backend unavailable".
fn classify_failure(status: u16, body: &str) -> TransportError {
    let upstream_message = serde_json::from_str::<UpstreamError>(body)
        .ok()
        .and_then(|e| e.error.message);
    let combined = format!("{} {body}", upstream_message.as_deref().unwrap_or_default())
        .to_lowercase();

    if status == 401 || status == 403 || AUTH_FAILURE_MARKERS.is_match(&combined) {
        TransportError::AuthenticationFailed {
            status,
            message: upstream_message.unwrap_or_else(|| body.to_string()),
        }
    } else {
        TransportError::Unavailable(format!("OpenRouter returned {status}: {body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::evaluation::prompts::build;
    use chrono::NaiveDate;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn payload() -> InstructionPayload {
        build(
            "John Doe, Software Engineer",
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        )
    }

    fn key() -> SecretString {
        SecretString::from("sk-or-v1-AbC123".to_string())
    }

    fn transport(server: &MockServer, site_url: Option<Url>) -> OpenRouterTransport {
        OpenRouterTransport::new(
            server.url("/api/v1/chat/completions"),
            site_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_classify_401_is_auth_failure() {
        let err = classify_failure(401, r#"{"error":{"message":"invalid api key"}}"#);
        assert!(matches!(
            err,
            TransportError::AuthenticationFailed { status: 401, ref message } if message == "invalid api key"
        ));
    }

    #[test]
    fn test_classify_403_is_auth_failure() {
        let err = classify_failure(403, "forbidden");
        assert!(matches!(err, TransportError::AuthenticationFailed { status: 403, .. }));
    }

    #[test]
    fn test_classify_auth_wording_on_other_status() {
        let err = classify_failure(400, r#"{"error":{"message":"No auth credentials found"}}"#);
        assert!(matches!(err, TransportError::AuthenticationFailed { .. }));

        let err = classify_failure(500, "Clerk session expired");
        assert!(matches!(err, TransportError::AuthenticationFailed { .. }));

        let err = classify_failure(400, "Invalid API Key supplied");
        assert!(matches!(err, TransportError::AuthenticationFailed { .. }));
    }

    #[test]
    fn test_classify_other_failures_are_unavailable() {
        let err = classify_failure(502, r#"{"error":{"message":"Provider returned error"}}"#);
        assert!(matches!(err, TransportError::Unavailable(_)));

        let err = classify_failure(429, "rate limited");
        assert!(matches!(err, TransportError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_send_returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/chat/completions")
                    .header("authorization", "Bearer sk-or-v1-AbC123")
                    .header("x-title", "ATS Resume Scorer")
                    .body_contains("\"max_tokens\":2000")
                    .body_contains("\"response_format\":{\"type\":\"json_object\"}")
                    .body_contains("\"model\":\"openai/gpt-oss-20b:free\"")
                    .body_contains("\"role\":\"system\"");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"score\": 70}"}}]
                }));
            })
            .await;

        let raw = transport(&server, None)
            .send(&payload(), "openai/gpt-oss-20b:free", Some(&key()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(raw.content, "{\"score\": 70}");
        assert_eq!(raw.status, 200);
    }

    #[tokio::test]
    async fn test_send_sets_referer_when_site_url_configured() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/chat/completions")
                    .header("http-referer", "https://scorer.example.com/");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": "{}"}}]
                }));
            })
            .await;

        let site_url = Url::parse("https://scorer.example.com").ok();
        transport(&server, site_url)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_401_maps_to_auth_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(401)
                    .body(r#"{"error":{"message":"invalid api key"}}"#);
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::AuthenticationFailed { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_send_server_error_maps_to_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(503).body("upstream overloaded");
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_send_missing_content_is_empty_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": ""}}]}));
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_send_whitespace_content_is_passed_on() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "   "}}]}));
            })
            .await;

        let raw = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap();
        assert_eq!(raw.content, "   ");
    }

    #[tokio::test]
    async fn test_send_timeout_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({"choices": [{"message": {"content": "{}"}}]}));
            })
            .await;

        let transport = OpenRouterTransport::new(
            server.url("/api/v1/chat/completions"),
            None,
            Duration::from_millis(300),
        )
        .unwrap();
        let err = transport
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(ref m) if m.contains("timed out")));
        assert_eq!(AppError::from(err).code(), "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_send_undecodable_success_body_is_invalid_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidEnvelope(_)));
        assert_eq!(AppError::from(err).code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_send_no_choices_is_empty_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_send_without_credential_makes_no_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200);
            })
            .await;

        let err = transport(&server, None)
            .send(&payload(), "m", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MissingCredential));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let transport = OpenRouterTransport::new(
            "http://127.0.0.1:9/api/v1/chat/completions".to_string(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = transport
            .send(&payload(), "m", Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
