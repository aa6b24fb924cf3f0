//! Error types for feed ingestion

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error taxonomy for the ingestion side of a run.
///
/// Failures are contained at the smallest meaningful unit: an `Auth` error
/// is fatal to one feed's jobs, a `StreamCorrupt` or `Request` error to one
/// job, and none of them abort the overall run. An empty discovery result
/// is not an error at all and is only logged.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("stream corrupt: {0}")]
    StreamCorrupt(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}
