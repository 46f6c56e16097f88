//! Configuration inspection commands

use crate::console::CliConsole;
use anyhow::{Context, Result};
use faultline_core::config::MetricsConfig;
use faultline_core::error::FaultlineResult;

/// Print the effective configuration as TOML
pub fn show(config: FaultlineResult<MetricsConfig>) -> Result<()> {
    let config = config.context("Failed to load configuration")?;
    print!("{}", render_toml(&config)?);
    Ok(())
}

/// Validate configuration and print a summary
pub fn check(config: FaultlineResult<MetricsConfig>, source: &str) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Check");
    console.info(&format!("Source: {}", source));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            console.error(&format!("Configuration is invalid: {}", e));
            return Err(e).context("Configuration check failed");
        }
    };

    console.success("Configuration is valid");
    console.print_separator();
    console.print_field("enabled", config.enabled);
    console.print_field("bucket width", format!("{:?}", config.bucket_width));
    console.print_field("retention window", format!("{:?}", config.retention_window));
    console.print_field("max buckets", config.max_buckets());
    console.print_field("max events", config.max_events);
    console.print_field(
        "exposition",
        if config.exposition.enabled {
            format!("on ({})", config.exposition.namespace)
        } else {
            "off".to_string()
        },
    );
    console.print_field("dashboard", on_off(config.dashboard_enabled));
    console.print_field(
        "tracking",
        match (config.tracking.enabled, config.tracking.endpoint.as_deref()) {
            (true, Some(endpoint)) => format!("on ({})", endpoint),
            (true, None) => "on (no endpoint)".to_string(),
            (false, _) => "off".to_string(),
        },
    );
    console.print_field("masked fields", config.pii_patterns.join(", "));

    if config.tracking.enabled && config.tracking.endpoint.is_none() {
        console.warn("Tracking is enabled without an endpoint; a transport must be supplied in code");
    }
    Ok(())
}

pub fn render_toml(config: &MetricsConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
