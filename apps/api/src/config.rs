use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::warn;

use crate::llm_client::{ollama, openrouter};

const DEFAULT_MODEL: &str = "openai/gpt-oss-20b:free";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every key has a default; provider credentials are supplied per request and
/// never configured here.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub openrouter_url: String,
    pub ollama_url: String,
    /// Sent as `HTTP-Referer` to OpenRouter when set to an absolute http(s) URL.
    pub site_url: Option<Url>,
    pub default_model: String,
    /// Upper bound on a single backend call. A timeout surfaces as upstream unavailable.
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            openrouter_url: openrouter::DEFAULT_ENDPOINT.to_string(),
            ollama_url: ollama::DEFAULT_BASE_URL.to_string(),
            site_url: None,
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            openrouter_url: std::env::var("OPENROUTER_URL").unwrap_or(defaults.openrouter_url),
            ollama_url: std::env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            site_url: std::env::var("SITE_URL")
                .ok()
                .and_then(|v| parse_site_url(&v)),
            default_model: std::env::var("DEFAULT_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.default_model),
            request_timeout: Duration::from_secs(parse_env(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}

/// Accepts only absolute http/https URLs; anything else is ignored with a warning.
fn parse_site_url(value: &str) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        _ => {
            warn!("Ignoring SITE_URL {value:?}: not an absolute http(s) URL");
            None
        }
    }
}
