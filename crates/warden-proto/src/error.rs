//! Error types for Bot API envelopes.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtoError`].
pub type Result<T, E = ProtoError> = std::result::Result<T, E>;

/// Errors raised while interpreting a Bot API response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// The body was not valid JSON for the expected shape.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered `ok: false`.
    #[error("api error {code}: {description}")]
    Api {
        /// Bot API `error_code`, 0 when absent.
        code: i64,
        /// Bot API `description`.
        description: String,
    },

    /// The API answered `ok: true` without a `result` field.
    #[error("response missing result")]
    MissingResult,
}
