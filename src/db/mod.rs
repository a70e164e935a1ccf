//! Persistent storage for per-chat state.
//!
//! One JSON document holds every chat's welcome configuration and warn
//! counters. A single writer task owns the in-memory copy (see
//! [`StoreHandle`]) and rewrites the whole file after each mutation.

mod document;
mod writer;

pub use document::{Document, WelcomeConfig, load, save, try_load};
pub use writer::StoreHandle;

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store writer task is gone")]
    Closed,
}
