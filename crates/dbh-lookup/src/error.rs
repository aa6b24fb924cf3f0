//! Error types for reputation lookups

use thiserror::Error;

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors from one vendor request. A failing batch is logged and its
/// candidates treated as unknown; it never aborts sibling batches or other
/// vendors.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing API key for vendor {0}")]
    MissingApiKey(String),
}
