//! Error types for the DBH CLI
//!
//! User-facing errors with actionable messages.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] dbh_ingest::IngestError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] dbh_lookup::LookupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
