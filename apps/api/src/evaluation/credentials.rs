//! Credential normalization and syntactic validation for the hosted provider.
//!
//! Purely lexical: nothing here contacts the backend. An authorized-but-wrong
//! key is only discovered from the transport response.

use lazy_static::lazy_static;
use regex::Regex;
use secrecy::SecretString;

use crate::errors::AppError;

lazy_static! {
    /// Leading authentication scheme, e.g. a pasted `Bearer ` header value.
    static ref SCHEME_PREFIX: Regex = Regex::new(r"(?i)^bearer\s+").expect("Invalid regex");

    /// OpenRouter key shape: fixed prefix, then one or more identifier characters.
    static ref OPENROUTER_KEY: Regex =
        Regex::new(r"^sk-or-v1-[A-Za-z0-9._-]+$").expect("Invalid regex");
}

/// Trims whitespace and strips a case-insensitive leading `Bearer ` prefix.
pub fn normalize(raw: &str) -> String {
    SCHEME_PREFIX.replace(raw.trim(), "").into_owned()
}

pub fn is_well_formed(key: &str) -> bool {
    OPENROUTER_KEY.is_match(key)
}

/// Normalizes and validates a raw credential, wrapping it so it cannot be
/// logged by accident.
pub fn validate(raw: Option<&str>) -> Result<SecretString, AppError> {
    let key = normalize(raw.unwrap_or_default());
    if key.is_empty() {
        return Err(AppError::MissingCredential);
    }
    if !is_well_formed(&key) {
        return Err(AppError::MalformedCredential);
    }
    Ok(SecretString::from(key))
}
