use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::Evaluator;
use crate::llm_client::OllamaTransport;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds static configuration and stateless collaborators only.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub evaluator: Evaluator,
    /// Local backend, also queried by the model catalog.
    pub local: Arc<OllamaTransport>,
}
