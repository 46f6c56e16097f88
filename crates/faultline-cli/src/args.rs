//! CLI argument definitions using clap
//!
//! - faultline config show      # Print the effective configuration
//! - faultline config check     # Validate configuration and report
//! - faultline simulate         # Record synthetic errors and print metrics

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Faultline - error code metrics for web services")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(long, global = true, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Record synthetic errors across threads and print the resulting metrics
    Simulate {
        /// Total number of errors to record
        #[arg(long, default_value_t = 10_000)]
        events: usize,

        /// Number of recording threads
        #[arg(long, default_value_t = 4)]
        threads: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective, validated configuration as TOML
    Show,

    /// Validate the configuration and summarize it
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Text exposition page
    Text,
    /// Dashboard summary as JSON
    Json,
}
