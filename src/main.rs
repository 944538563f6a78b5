//! SortCopy CLI - copy a directory tree into per-extension folders
//!
//! Checks the run preconditions, clears the destination, installs logging
//! and drives the sort engine on a tokio runtime.

use clap::Parser;
use sortcopy::config::{CliArgs, OutputFormat, SortConfig};
use sortcopy::core::{RunSummary, SortEngine};
use sortcopy::error::{IoResultExt, Result, SortCopyError};
use sortcopy::fs::prepare_destination;
use sortcopy::progress::ProgressReporter;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Exit code used when the run is interrupted with Ctrl+C
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle result
    match run(args) {
        Ok(()) => {}
        Err(SortCopyError::Cancelled) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(args: &CliArgs) -> Result<()> {
    let level = if args.quiet {
        "warn"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)
        .with_path(&args.log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

fn run(args: CliArgs) -> Result<()> {
    // Build and check configuration
    let config = SortConfig::from_cli(&args).map_err(SortCopyError::ConfigError)?;
    config.validate()?;

    if prepare_destination(&config.destination)? {
        info!(
            "Destination '{}' existed and was removed",
            config.destination.display()
        );
    }

    let progress = if args.progress && !args.quiet {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };
    let engine = SortEngine::new(config).with_progress(progress);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| SortCopyError::config(format!("Failed to create runtime: {}", e)))?;

    let result = runtime.block_on(engine.run_until(interrupted()));

    // In-flight copies are abandoned on interrupt; don't wait for them
    runtime.shutdown_background();

    let summary = result?;
    if !args.quiet {
        print_summary(&summary, args.output_format)?;
    }

    Ok(())
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => summary.print_summary(),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary)
                .map_err(|e| SortCopyError::config(format!("Failed to encode summary: {}", e)))?;
            println!("{}", json);
        }
    }
    Ok(())
}
