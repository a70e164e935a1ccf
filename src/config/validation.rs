//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.token is required (or set CHATWARDEN_TOKEN)")]
    MissingToken,
    #[error("bot.owners contains a non-positive user id: {0}")]
    InvalidOwner(i64),
    #[error("store.path must not be empty")]
    EmptyStorePath,
    #[error("search.timeout_secs must be greater than zero")]
    ZeroSearchTimeout,
    #[error("search.api_url must be an http(s) URL, got '{0}'")]
    InvalidSearchUrl(String),
    #[error("telegram.api_url must be an http(s) URL, got '{0}'")]
    InvalidApiUrl(String),
}

impl ValidationError {
    /// Errors that make it impossible to run at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingToken)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    for owner in &config.bot.owners {
        if *owner <= 0 {
            errors.push(ValidationError::InvalidOwner(*owner));
        }
    }

    if config.store.path.trim().is_empty() {
        errors.push(ValidationError::EmptyStorePath);
    }

    if config.search.timeout_secs == 0 {
        errors.push(ValidationError::ZeroSearchTimeout);
    }
    if !is_http_url(&config.search.api_url) {
        errors.push(ValidationError::InvalidSearchUrl(
            config.search.api_url.clone(),
        ));
    }

    if !is_http_url(&config.telegram.api_url) {
        errors.push(ValidationError::InvalidApiUrl(
            config.telegram.api_url.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
