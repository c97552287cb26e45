//! Memory error types.

use ragmem_core::{ConfigError, ValidationError};
use thiserror::Error;

/// Errors that can occur during memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedding generation failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Storage backend error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Input rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A bulk delete stopped part way through.
    #[error("Bulk delete stopped after {deleted} records: {source}")]
    PartialDelete {
        deleted: usize,
        #[source]
        source: Box<MemoryError>,
    },
}
