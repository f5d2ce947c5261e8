//! # Sensor Display CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading, overrides and validation
//! - Pipeline orchestration and lifecycle management
//! - Graceful shutdown on Ctrl+C / SIGTERM

mod cli;
mod commands;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{prepare_run, run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Held until exit so the error log is flushed after the last event
    let _log_guard;
    let result = match &cli.command {
        Commands::Run(args) => {
            // The error log path comes from the resolved config
            let prepared = prepare_run(args);
            _log_guard = init_logging(&cli, prepared.error_log.clone(), prepared.metrics_port)?;
            run_pipeline(args, prepared).await
        }
        Commands::Validate(args) => {
            _log_guard = init_logging(&cli, None, None)?;
            run_validate(args)
        }
        Commands::Info(args) => {
            _log_guard = init_logging(&cli, None, None)?;
            run_info(args)
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(
    cli: &Cli,
    error_log: Option<PathBuf>,
    metrics_port: Option<u16>,
) -> Result<observability::LogGuard> {
    let default_log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let guard = observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: default_log_level.to_string(),
        ignore_env_filter: cli.quiet,
        error_log,
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "Sensor Display CLI starting");
    Ok(guard)
}
