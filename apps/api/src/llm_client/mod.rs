/// LLM Client: the single point of entry for all model backend calls.
///
/// ARCHITECTURAL RULE: No other module may call a model backend directly.
/// Every backend is reached through `ProviderTransport`, so the orchestrator
/// only selects which transport to call and never branches on its internals.
///
/// No retries: a failed call is surfaced to the caller immediately.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use thiserror::Error;

use crate::evaluation::prompts::InstructionPayload;

pub mod ollama;
pub mod openrouter;

pub use ollama::OllamaTransport;
pub use openrouter::OpenRouterTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("credential required but not supplied")]
    MissingCredential,

    #[error("authentication failed (status {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("{0}")]
    Unavailable(String),

    #[error("upstream returned empty content")]
    EmptyResponse,

    #[error("unreadable upstream envelope: {0}")]
    InvalidEnvelope(String),
}

impl TransportError {
    /// Connection failures and timeouts mean the backend is unavailable; a body
    /// that arrived but would not decode is an envelope problem.
    fn from_request(backend: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::InvalidEnvelope(format!("{backend}: {err}"))
        } else if err.is_timeout() {
            TransportError::Unavailable(format!("{backend} timed out: {err}"))
        } else {
            TransportError::Unavailable(format!("{backend} request failed: {err}"))
        }
    }
}

/// Raw backend output: the model's text plus the HTTP status it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    pub content: String,
    pub status: u16,
}

/// A model backend. Implementations adapt the instruction payload to their
/// own request shape and return the untouched model text.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(
        &self,
        payload: &InstructionPayload,
        model: &str,
        credential: Option<&SecretString>,
    ) -> Result<RawOutput, TransportError>;
}

/// Builds the HTTP client shared by every call a transport makes.
fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}
