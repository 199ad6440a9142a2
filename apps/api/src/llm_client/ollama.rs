//! Local transport: Ollama generate API.
//!
//! No credential, no authentication failure mode. A missing `response` field
//! is passed on as empty output and left for the normalizer to degrade.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{http_client, ProviderTransport, RawOutput, TransportError};
use crate::evaluation::prompts::InstructionPayload;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: Option<String>,
}

pub struct OllamaTransport {
    client: Client,
    base_url: String,
}

impl OllamaTransport {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Names of the models installed on the local service.
    pub async fn list_models(&self) -> Result<Vec<String>, TransportError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| TransportError::from_request("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Unavailable(format!(
                "Ollama tags returned {status}"
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| TransportError::from_request("Ollama", e))?;
        Ok(tags.models.into_iter().filter_map(|m| m.name).collect())
    }
}

#[async_trait]
impl ProviderTransport for OllamaTransport {
    async fn send(
        &self,
        payload: &InstructionPayload,
        model: &str,
        _credential: Option<&SecretString>,
    ) -> Result<RawOutput, TransportError> {
        let prompt = payload.composed();
        let request_body = GenerateRequest {
            model,
            prompt: &prompt,
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .header("content-type", "application/json; charset=utf-8")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| TransportError::from_request("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Ollama API error ({status}): {body}");
            return Err(TransportError::Unavailable(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TransportError::from_request("Ollama", e))?;
        let content = generated.response.unwrap_or_default();

        debug!("Ollama call succeeded: model={model}, chars={}", content.len());

        Ok(RawOutput {
            content,
            status: status.as_u16(),
        })
    }
}
