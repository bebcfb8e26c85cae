//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by the search index subsystem.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Index record store I/O failure (sqlite layer).
    #[error("index store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),

    /// Malformed source data that cannot be projected into an index record.
    #[error("projection error for {entity_type} {entity_id}: {message}")]
    Projection {
        entity_type: String,
        entity_id: String,
        message: String,
    },

    /// Source store lookup failed (not "not found" — a genuine I/O error).
    #[error("source store error: {0}")]
    Source(String),

    /// The job queue has been shut down; no further jobs are accepted.
    #[error("job queue closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
