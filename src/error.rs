//! Unified error handling for chatwarden.
//!
//! Every command failure is one of four kinds. Each maps to a metric label
//! and, except internal errors, to the reply the issuer sees.

use crate::db::StoreError;
use crate::platform::PlatformError;
use crate::security::Denial;
use thiserror::Error;

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or missing arguments; nothing was attempted.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Unauthorized(#[from] Denial),

    /// A platform mutation failed; `action` completes "Failed to ...".
    #[error("Failed to {action}: {source}")]
    Platform {
        action: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn usage(text: impl Into<String>) -> Self {
        Self::Usage(text.into())
    }

    pub fn platform(action: &'static str, source: PlatformError) -> Self {
        Self::Platform { action, source }
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Unauthorized(denial) => denial.error_code(),
            Self::Platform { .. } => "platform",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Text to reply with, or `None` for errors only worth logging.
    pub fn reply_text(&self) -> Option<String> {
        match self {
            Self::Internal(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for command handlers: the reply text, if any.
pub type HandlerResult = Result<Option<String>, HandlerError>;
