//! Axum route handler for the Evaluation API.

use anyhow::anyhow;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    Json,
};
use chrono::Local;
use tracing::debug;

use crate::errors::AppError;
use crate::evaluation::Submission;
use crate::extraction::Document;
use crate::models::evaluation::{EvaluationResult, ProviderVariant};
use crate::state::AppState;

/// Fields of the upload form. Unknown fields are ignored.
#[derive(Default)]
struct ScoreForm {
    document: Option<Document>,
    model: Option<String>,
    provider: Option<String>,
    api_key: Option<String>,
}

impl ScoreForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ScoreForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "file" => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.document = Some(Document::new(bytes, content_type));
                }
                "model" => form.model = Some(field.text().await.map_err(multipart_error)?),
                "provider" => form.provider = Some(field.text().await.map_err(multipart_error)?),
                "apiKey" => form.api_key = Some(field.text().await.map_err(multipart_error)?),
                _ => debug!("Ignoring unknown form field {name:?}"),
            }
        }

        Ok(form)
    }

    fn into_submission(self, default_model: &str) -> Submission {
        let model = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model.to_string());
        Submission {
            document: self.document,
            provider: ProviderVariant::from_form_value(self.provider.as_deref()),
            model,
            credential: self.api_key,
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Internal(anyhow!("Failed to read upload form: {err}"))
}

/// POST /api/v1/score
///
/// Evaluates an uploaded resume (PDF or plain text) with the selected provider
/// and returns the normalized score report. A request that is not multipart at
/// all carries no document and is rejected as such.
pub async fn handle_score(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EvaluationResult>, AppError> {
    let form = match multipart {
        Ok(multipart) => ScoreForm::read(multipart).await?,
        Err(rejection) => {
            debug!("Score request is not multipart: {rejection}");
            ScoreForm::default()
        }
    };

    let submission = form.into_submission(&state.config.default_model);
    let as_of = Local::now().date_naive();
    let result = state.evaluator.evaluate(submission, as_of).await?;

    Ok(Json(result))
}
