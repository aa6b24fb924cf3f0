//! DBH CLI - Main entry point

use clap::Parser;
use dbh_cli::{Cli, Commands};
use dbh_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Honor a .env file for credentials and endpoints
    dotenvy::dotenv().ok();

    // Initialize logging based on verbose flag and environment
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .output(LogOutput::Console)
            .log_file_prefix("dbh")
            .build()
    } else {
        LogConfig::builder()
            .level(LogLevel::Info)
            .output(LogOutput::Console)
            .log_file_prefix("dbh")
            .build()
    };

    // Environment variables take precedence over the flag-derived defaults
    let log_config = log_config
        .merged_with_env()
        .unwrap_or_else(|_| LogConfig::default());
    let _ = init_logging(&log_config);

    let result = execute_command(&cli).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> dbh_cli::Result<()> {
    match &cli.command {
        Commands::Update { sources } => dbh_cli::commands::update::run(sources.clone()).await,
        Commands::Generate {
            limit,
            from_store,
            output_dir,
        } => dbh_cli::commands::generate::run(*limit, *from_store, output_dir).await,
    }
}
