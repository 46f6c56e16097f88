//! Faultline CLI
//!
//! Operator tooling for the error metrics engine: inspect the layered
//! configuration (file, then `FAULTLINE_*` environment) and drive synthetic
//! load through a metrics context to see what the exporters produce.
//!
//! ```bash
//! faultline config show --config faultline.toml
//! faultline simulate --events 50000 --threads 8 --format json
//! ```

mod args;
mod commands;
mod console;
mod logging;

use anyhow::Result;
use args::{Cli, Commands, ConfigAction};
use clap::Parser;
use faultline_core::config::{LoggingConfig, load as load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    logging::init(&logging_config);

    let source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults + environment".to_string());
    tracing::debug!(source = %source, "configuration loaded");

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(config),
            ConfigAction::Check => commands::config::check(config, &source),
        },
        Commands::Simulate {
            events,
            threads,
            format,
        } => commands::simulate::run(config, events, threads, format).await,
    }
}
