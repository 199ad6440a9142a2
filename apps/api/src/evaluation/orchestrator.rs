//! Evaluation Orchestrator: one request/response cycle.
//!
//! ReceivingInput → ExtractingText → BuildingPrompt → Dispatching → Normalizing → Done,
//! with any stage able to short-circuit into a typed `AppError`. Everything
//! that can be rejected without a network call is rejected before dispatch.
//! Normalizing never fails: unusable model output becomes the sentinel result.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::evaluation::{credentials, normalizer, prompts};
use crate::extraction::{Document, TextExtractor};
use crate::llm_client::ProviderTransport;
use crate::models::evaluation::{EvaluationResult, ProviderVariant};

/// Everything the caller submitted for one evaluation.
pub struct Submission {
    pub document: Option<Document>,
    pub provider: ProviderVariant,
    pub model: String,
    pub credential: Option<String>,
}

/// Holds the collaborators only; no per-request state is kept between calls.
#[derive(Clone)]
pub struct Evaluator {
    extractor: Arc<dyn TextExtractor>,
    remote: Arc<dyn ProviderTransport>,
    local: Arc<dyn ProviderTransport>,
}

impl Evaluator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        remote: Arc<dyn ProviderTransport>,
        local: Arc<dyn ProviderTransport>,
    ) -> Self {
        Self {
            extractor,
            remote,
            local,
        }
    }

    fn transport(&self, provider: ProviderVariant) -> &dyn ProviderTransport {
        match provider {
            ProviderVariant::Remote => self.remote.as_ref(),
            ProviderVariant::Local => self.local.as_ref(),
        }
    }

    pub async fn evaluate(
        &self,
        submission: Submission,
        as_of: NaiveDate,
    ) -> Result<EvaluationResult, AppError> {
        let document = submission.document.ok_or(AppError::NoDocument)?;
        if document.kind().is_none() {
            return Err(AppError::UnsupportedFormat(document.content_type));
        }

        // CPU-bound parse, kept off the async executor.
        let extractor = Arc::clone(&self.extractor);
        let upload = document.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&upload))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}"))
            })??;
        if text.trim().is_empty() {
            return Err(AppError::EmptyText);
        }
        debug!("Extracted {} chars from {}", text.len(), document.content_type);

        let payload = prompts::build(&text, as_of);

        let credential = if submission.provider.requires_credential() {
            Some(credentials::validate(submission.credential.as_deref())?)
        } else {
            None
        };

        info!(
            "Dispatching evaluation: provider={}, model={}",
            submission.provider.as_str(),
            submission.model
        );
        let raw = self
            .transport(submission.provider)
            .send(&payload, &submission.model, credential.as_ref())
            .await?;

        debug!("Backend replied: status={}, chars={}", raw.status, raw.content.len());

        let result = normalizer::parse(&raw.content);
        if result.is_available() {
            let scored_sections = result
                .sections
                .iter()
                .filter(|(_, section)| section.score.is_some())
                .count();
            info!(
                "Evaluation complete: provider={}, model={}, score={:?}, scored_sections={scored_sections}",
                submission.provider.as_str(),
                submission.model,
                result.score
            );
        } else {
            warn!(
                "Model output could not be normalized, returning unavailable result: provider={}, model={}",
                submission.provider.as_str(),
                submission.model
            );
        }

        Ok(result)
    }
}
