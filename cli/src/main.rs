//! CLI entrypoint for planning-poker
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod simulate;

use anyhow::{Result, bail};
use clap::Parser;
use commands::{Cli, Command, OutputFormat};
use poker_infrastructure::{ConfigLoader, FileConfig};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_FILE_PREFIX: &str = "planning-poker.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config goes first so the log directory is known before logging starts
    let config = load_config(&cli)?;
    let _guard = init_logging(cli.verbose, &config);

    info!("Starting planning-poker");

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            warn!("Invalid configuration: {}", issue);
        }
        bail!(
            "configuration has {} issue(s): {}",
            issues.len(),
            issues
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
    }

    match cli.command {
        Command::ShowConfig => {
            if cli.no_config {
                println!("Configuration files disabled (--no-config)");
            } else {
                ConfigLoader::print_config_sources(cli.config.as_ref());
            }
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Command::Simulate(args) => {
            let report = simulate::run(&config, &args).await?;
            let output = match args.output {
                OutputFormat::Summary => simulate::format_summary(&report),
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            };
            println!("{}", output);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))
}

/// Console logging by verbosity, plus a daily file when `[logging] directory`
/// is set. The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = |verbose: u8| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(filter(verbose));

    let (file, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                // The file keeps at least info regardless of -v
                .with_filter(filter(verbose.max(1)));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
