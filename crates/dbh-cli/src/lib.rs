//! DBH CLI Library
//!
//! Command-line interface for the domain blocklist harvester.
//!
//! # Overview
//!
//! - **Feed ingestion**: harvest candidate domains from the configured
//!   feeds into the local store (`dbh update`)
//! - **Blocklist generation**: classify a candidate set against the Safe
//!   Browsing vendors and write the blocklist files (`dbh generate`)
//!
//! Credentials and endpoints come from the environment (a `.env` file is
//! honored); see `IngestConfig::from_env` for the recognized variables.

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// DBH - Domain Blocklist Harvester
#[derive(Parser, Debug)]
#[command(name = "dbh")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest all configured feeds into the local store
    Update {
        /// Override the active feed sources (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sources: Option<Vec<String>>,
    },

    /// Classify candidates and write blocklist files
    Generate {
        /// Classify the N least-popular ranking entries
        #[arg(short, long, default_value_t = 1500)]
        limit: usize,

        /// Classify the full persisted store instead of the ranking slice
        #[arg(long)]
        from_store: bool,

        /// Directory the blocklist files are written to
        #[arg(short, long, default_value = "blocklists")]
        output_dir: String,
    },
}
