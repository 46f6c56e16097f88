//! Configuration validation

use super::metrics_config::MetricsConfig;
use crate::error::{FaultlineError, FaultlineResult};
use crate::telemetry::bucket::MAX_WINDOW;
use std::time::Duration;

/// Upper bound for the recent-events ring
pub const MAX_EVENTS_LIMIT: usize = 1_000_000;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &MetricsConfig) -> FaultlineResult<()> {
        Self::validate_window(config)?;
        Self::validate_capacity(config)?;
        Self::validate_exposition(config)?;
        Self::validate_tracking(config)?;
        Self::validate_logging(config)?;
        Ok(())
    }

    /// Bucket width and retention must be positive, bounded and consistent
    fn validate_window(config: &MetricsConfig) -> FaultlineResult<()> {
        if config.bucket_width < Duration::from_millis(1) {
            return Err(FaultlineError::config_field(
                "bucket_width",
                "Bucket width must be at least 1ms",
            ));
        }
        // Buckets are aligned on epoch milliseconds.
        if config.bucket_width.subsec_nanos() % 1_000_000 != 0 {
            return Err(FaultlineError::config_field(
                "bucket_width",
                format!(
                    "Bucket width must be a whole number of milliseconds, got {:?}",
                    config.bucket_width
                ),
            ));
        }
        if config.retention_window.is_zero() {
            return Err(FaultlineError::config_field(
                "retention_window",
                "Retention window must be greater than 0",
            ));
        }
        if config.retention_window < config.bucket_width {
            return Err(FaultlineError::config_field(
                "retention_window",
                format!(
                    "Retention window ({:?}) must not be shorter than the bucket width ({:?})",
                    config.retention_window, config.bucket_width
                ),
            ));
        }
        if config.retention_window > MAX_WINDOW {
            return Err(FaultlineError::config_field(
                "retention_window",
                format!(
                    "Retention window must not exceed {:?}, got {:?}",
                    MAX_WINDOW, config.retention_window
                ),
            ));
        }
        Ok(())
    }

    fn validate_capacity(config: &MetricsConfig) -> FaultlineResult<()> {
        if config.max_events == 0 {
            return Err(FaultlineError::config_field(
                "max_events",
                "Max events must be greater than 0",
            ));
        }
        if config.max_events > MAX_EVENTS_LIMIT {
            return Err(FaultlineError::config_field(
                "max_events",
                format!(
                    "Max events must not exceed {}, got {}",
                    MAX_EVENTS_LIMIT, config.max_events
                ),
            ));
        }
        Ok(())
    }

    fn validate_exposition(config: &MetricsConfig) -> FaultlineResult<()> {
        let namespace = &config.exposition.namespace;
        let mut chars = namespace.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_head || !valid_tail {
            return Err(FaultlineError::config_field(
                "exposition.namespace",
                format!("Invalid metric namespace '{}'", namespace),
            ));
        }
        Ok(())
    }

    fn validate_tracking(config: &MetricsConfig) -> FaultlineResult<()> {
        let tracking = &config.tracking;
        if tracking.queue_capacity == 0 {
            return Err(FaultlineError::config_field(
                "tracking.queue_capacity",
                "Tracking queue capacity must be greater than 0",
            ));
        }
        if tracking.send_timeout.is_zero() {
            return Err(FaultlineError::config_field(
                "tracking.send_timeout",
                "Tracking send timeout must be greater than 0",
            ));
        }
        if let Some(endpoint) = &tracking.endpoint {
            let endpoint = endpoint.trim();
            if endpoint.is_empty() {
                return Err(FaultlineError::config_field(
                    "tracking.endpoint",
                    "Tracking endpoint cannot be empty",
                ));
            }
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(FaultlineError::config_field(
                    "tracking.endpoint",
                    format!("Tracking endpoint must be an http(s) URL, got '{}'", endpoint),
                ));
            }
        }
        Ok(())
    }

    fn validate_logging(config: &MetricsConfig) -> FaultlineResult<()> {
        let level = config.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(FaultlineError::config_field(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {:?}",
                    config.logging.level, VALID_LOG_LEVELS
                ),
            ));
        }
        Ok(())
    }
}
