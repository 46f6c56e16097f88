//! Configuration for the error metrics engine
//!
//! Configuration is layered: defaults, then an optional TOML/JSON file, then
//! `FAULTLINE_*` environment variables. The result is validated once, before
//! any collector is constructed.

pub mod env_loader;
pub mod file_loader;
pub mod logging_config;
pub mod metrics_config;
pub mod presets;
pub mod validation;

pub use env_loader::{apply_env_overrides, load_from_env};
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use metrics_config::{
    DEFAULT_PII_PATTERNS, ExpositionConfig, MetricsConfig, TrackingConfig,
};
pub use presets::MetricsPreset;
pub use validation::ConfigValidator;

use crate::error::FaultlineResult;
use std::path::Path;

/// Load configuration from an optional file, apply environment overrides and validate.
pub fn load(path: Option<&Path>) -> FaultlineResult<MetricsConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::debug!("Loading metrics config from file: {}", path.display());
            load_from_file(path)?
        }
        None => MetricsConfig::default(),
    };

    apply_env_overrides(&mut config, std::env::vars())?;
    config.validate()?;
    Ok(config)
}
