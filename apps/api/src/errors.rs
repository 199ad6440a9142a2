use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::llm_client::TransportError;

/// Application-level error type. The set of kinds is closed: every failure
/// of an evaluation ends up as exactly one of these.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No document attached")]
    NoDocument,

    #[error("Unsupported document type: {0:?}")]
    UnsupportedFormat(String),

    #[error("Document contains no text")]
    EmptyText,

    #[error("Credential missing")]
    MissingCredential,

    #[error("Credential malformed")]
    MalformedCredential,

    #[error("Upstream rejected the credential: {0}")]
    AuthenticationFailed(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream returned no content")]
    EmptyResponse,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoDocument
            | AppError::UnsupportedFormat(_)
            | AppError::EmptyText
            | AppError::MissingCredential
            | AppError::MalformedCredential => StatusCode::BAD_REQUEST,
            AppError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::UpstreamUnavailable(_) | AppError::EmptyResponse | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoDocument => "NO_DOCUMENT",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::EmptyText => "EMPTY_TEXT",
            AppError::MissingCredential => "MISSING_CREDENTIAL",
            AppError::MalformedCredential => "MALFORMED_CREDENTIAL",
            AppError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::EmptyResponse => "EMPTY_RESPONSE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The fixed message shown to the user. Upstream details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::NoDocument => "No file provided",
            AppError::UnsupportedFormat(_) => {
                "Unsupported file type. Please upload PDF or TXT file."
            }
            AppError::EmptyText => "Could not extract text from the file",
            AppError::MissingCredential => "OpenRouter API key is required",
            AppError::MalformedCredential => {
                "Invalid OpenRouter API key format. It should start with \"sk-or-v1-\"."
            }
            AppError::AuthenticationFailed(_) => {
                "OpenRouter authentication failed. Please verify your API key."
            }
            AppError::UpstreamUnavailable(_) => "Failed to analyze resume with AI",
            AppError::EmptyResponse => "No response from AI",
            AppError::Internal(_) => "Failed to process resume",
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(content_type) => {
                AppError::UnsupportedFormat(content_type)
            }
            ExtractError::ExtractionFailed(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MissingCredential => AppError::MissingCredential,
            TransportError::AuthenticationFailed { .. } => {
                AppError::AuthenticationFailed(err.to_string())
            }
            TransportError::Unavailable(_) => AppError::UpstreamUnavailable(err.to_string()),
            TransportError::EmptyResponse => AppError::EmptyResponse,
            TransportError::InvalidEnvelope(_) => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::AuthenticationFailed(detail) => {
                tracing::warn!("Authentication failed upstream: {detail}")
            }
            AppError::UpstreamUnavailable(detail) => tracing::error!("Upstream error: {detail}"),
            AppError::EmptyResponse => tracing::error!("Upstream returned no content"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => tracing::debug!("Rejected request: {self}"),
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Response used by `CatchPanicLayer` when a handler panics.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_bad_request() {
        for err in [
            AppError::NoDocument,
            AppError::UnsupportedFormat("image/png".to_string()),
            AppError::EmptyText,
            AppError::MissingCredential,
            AppError::MalformedCredential,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn test_authentication_failure_is_unauthorized() {
        let err = AppError::AuthenticationFailed("invalid api key".to_string());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "AUTHENTICATION_FAILED");
    }

    #[test]
    fn test_upstream_and_internal_errors_are_server_errors() {
        for err in [
            AppError::UpstreamUnavailable("timeout".to_string()),
            AppError::EmptyResponse,
            AppError::Internal(anyhow::anyhow!("boom")),
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "{err}");
        }
    }

    #[test]
    fn test_extraction_failure_maps_to_internal() {
        let err: AppError = ExtractError::ExtractionFailed("bad xref".to_string()).into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.user_message(), "Failed to process resume");
    }

    #[test]
    fn test_transport_errors_map_to_taxonomy() {
        let auth: AppError = TransportError::AuthenticationFailed {
            status: 401,
            message: "invalid api key".to_string(),
        }
        .into();
        assert_eq!(auth.code(), "AUTHENTICATION_FAILED");

        let down: AppError = TransportError::Unavailable("connection refused".to_string()).into();
        assert_eq!(down.code(), "UPSTREAM_UNAVAILABLE");

        let empty: AppError = TransportError::EmptyResponse.into();
        assert_eq!(empty.code(), "EMPTY_RESPONSE");

        let envelope: AppError = TransportError::InvalidEnvelope("eof".to_string()).into();
        assert_eq!(envelope.code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AppError::MalformedCredential.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "MALFORMED_CREDENTIAL");
        assert_eq!(
            body["error"]["message"],
            "Invalid OpenRouter API key format. It should start with \"sk-or-v1-\"."
        );
    }

    #[test]
    fn test_panic_response_is_internal_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
