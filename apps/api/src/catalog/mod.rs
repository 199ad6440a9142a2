//! Model catalog: the models a caller may pick from.
//!
//! A fixed list of free hosted models, followed by whatever the local service
//! has installed. The local half is best-effort: if it cannot be reached the
//! catalog is just the hosted list.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::debug;

use crate::llm_client::OllamaTransport;
use crate::models::evaluation::{ProviderModel, ProviderVariant};
use crate::state::AppState;

const REMOTE_MODELS: &[(&str, &str)] = &[
    ("arcee-ai/trinity-large-preview:free", "Trinity Large Preview"),
    ("stepfun/step-3.5-flash:free", "Step 3.5 Flash"),
    ("z-ai/glm-4.5-air:free", "GLM 4.5 Air"),
    ("deepseek/deepseek-r1-0528:free", "DeepSeek R1 0528"),
    ("nvidia/nemotron-3-nano-30b-a3b:free", "Nemotron 3 Nano 30B A3B"),
    ("openai/gpt-oss-120b:free", "ChatGPT OSS 120B"),
    ("meta-llama/llama-3.3-70b-instruct:free", "Llama 3.3 70B Instruct"),
    (
        "cognitivecomputations/dolphin-mistral-24b-venice-edition:free",
        "Dolphin Mistral 24B Venice Edition",
    ),
];

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ProviderModel>,
}

pub fn remote_models() -> Vec<ProviderModel> {
    REMOTE_MODELS
        .iter()
        .map(|(id, name)| ProviderModel {
            id: id.to_string(),
            display_name: name.to_string(),
            provider: ProviderVariant::Remote,
        })
        .collect()
}

pub async fn list_models(local: &OllamaTransport) -> Vec<ProviderModel> {
    let mut models = remote_models();
    match local.list_models().await {
        Ok(names) => models.extend(names.into_iter().map(|name| ProviderModel {
            id: name.clone(),
            display_name: name,
            provider: ProviderVariant::Local,
        })),
        Err(e) => debug!("Ollama not available: {e}"),
    }
    models
}

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        models: list_models(&state.local).await,
    })
}
