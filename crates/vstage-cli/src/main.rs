//! vstage reconcile - Main entry point

use clap::Parser;
use std::process;
use tracing::error;
use vstage_cli::Cli;
use vstage_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("vstage-reconcile".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = vstage_cli::commands::reconcile::run(cli.to_options()).await {
        error!(error = %e, "Reconciliation failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
