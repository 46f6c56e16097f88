//! File-based configuration loading

use super::metrics_config::MetricsConfig;
use crate::error::{FaultlineError, FaultlineResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports TOML (`.toml`) and JSON (any other extension).
/// Returns the default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> FaultlineResult<MetricsConfig> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(MetricsConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        FaultlineError::io_with_path(
            format!("Failed to read config file: {}", e),
            path.display().to_string(),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            FaultlineError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            FaultlineError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}
