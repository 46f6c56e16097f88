//! Preset configurations for common deployment scenarios

use super::metrics_config::MetricsConfig;
use crate::error::{FaultlineError, FaultlineResult};
use std::time::Duration;

/// Factory for `MetricsConfig` presets
pub struct MetricsPreset;

impl MetricsPreset {
    /// Local development: small ring, no external tracking
    pub fn development() -> MetricsConfig {
        MetricsConfig {
            max_events: 1_000,
            ..MetricsConfig::default()
        }
    }

    /// Production: larger ring, 30s buckets and tracking to `endpoint`
    pub fn production(endpoint: impl Into<String>) -> FaultlineResult<MetricsConfig> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(FaultlineError::config_field(
                "tracking.endpoint",
                "An endpoint is required for the production preset",
            ));
        }

        let mut config = MetricsConfig {
            bucket_width: Duration::from_secs(30),
            max_events: 50_000,
            ..MetricsConfig::default()
        };
        config.tracking.enabled = true;
        config.tracking.endpoint = Some(endpoint);
        config.validate()?;
        Ok(config)
    }

    /// Tests: collection disabled so suites don't interfere with each other
    pub fn testing() -> MetricsConfig {
        let mut config = MetricsConfig {
            enabled: false,
            max_events: 500,
            dashboard_enabled: false,
            ..MetricsConfig::default()
        };
        config.exposition.enabled = false;
        config
    }

    /// Everything off
    pub fn disabled() -> MetricsConfig {
        let mut config = MetricsConfig {
            enabled: false,
            dashboard_enabled: false,
            ..MetricsConfig::default()
        };
        config.exposition.enabled = false;
        config.tracking.enabled = false;
        config
    }
}
