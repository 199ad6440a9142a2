mod catalog;
mod config;
mod errors;
mod evaluation;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::evaluation::Evaluator;
use crate::extraction::DocumentTextExtractor;
use crate::llm_client::{OllamaTransport, OpenRouterTransport};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS Scorer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize provider transports
    let remote = Arc::new(OpenRouterTransport::new(
        config.openrouter_url.clone(),
        config.site_url.clone(),
        config.request_timeout,
    )?);
    let local = Arc::new(OllamaTransport::new(
        config.ollama_url.clone(),
        config.request_timeout,
    )?);
    info!(
        "Transports initialized (remote: {}, local: {}, timeout: {:?})",
        config.openrouter_url, config.ollama_url, config.request_timeout
    );

    let evaluator = Evaluator::new(Arc::new(DocumentTextExtractor), remote, local.clone());

    let state = AppState {
        config: config.clone(),
        evaluator,
        local,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to SITE_URL once the frontend origin is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
