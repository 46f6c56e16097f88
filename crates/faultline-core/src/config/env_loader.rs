//! Environment variable-based configuration loading
//!
//! Every setting can be overridden with a `FAULTLINE_` prefixed variable.
//! Unparsable values are reported as configuration errors rather than
//! silently falling back to defaults.

use super::logging_config::LogFormat;
use super::metrics_config::MetricsConfig;
use crate::error::{FaultlineError, FaultlineResult};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "FAULTLINE_";

/// Build a configuration from defaults and the process environment
pub fn load_from_env() -> FaultlineResult<MetricsConfig> {
    let mut config = MetricsConfig::default();
    apply_env_overrides(&mut config, std::env::vars())?;
    config.validate()?;
    Ok(config)
}

/// Apply `FAULTLINE_*` overrides from `vars` onto `config`
///
/// Unrelated variables are ignored. The result is not validated.
pub fn apply_env_overrides<I>(config: &mut MetricsConfig, vars: I) -> FaultlineResult<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|suffix| (suffix.to_string(), value))
        })
        .collect();

    if let Some(value) = vars.get("ENABLED") {
        config.enabled = parse_bool("ENABLED", value)?;
    }
    if let Some(value) = vars.get("BUCKET_WIDTH") {
        config.bucket_width = parse_duration("BUCKET_WIDTH", value)?;
    }
    if let Some(value) = vars.get("RETENTION_WINDOW") {
        config.retention_window = parse_duration("RETENTION_WINDOW", value)?;
    }
    if let Some(value) = vars.get("MAX_EVENTS") {
        config.max_events = parse_number("MAX_EVENTS", value)?;
    }
    if let Some(value) = vars.get("DASHBOARD_ENABLED") {
        config.dashboard_enabled = parse_bool("DASHBOARD_ENABLED", value)?;
    }
    if let Some(value) = vars.get("PII_PATTERNS") {
        let patterns = parse_list(value);
        if !patterns.is_empty() {
            config.pii_patterns = patterns;
        }
    }

    if let Some(value) = vars.get("EXPOSITION_ENABLED") {
        config.exposition.enabled = parse_bool("EXPOSITION_ENABLED", value)?;
    }
    if let Some(value) = vars.get("EXPOSITION_NAMESPACE") {
        config.exposition.namespace = value.trim().to_string();
    }

    if let Some(value) = vars.get("TRACKING_ENABLED") {
        config.tracking.enabled = parse_bool("TRACKING_ENABLED", value)?;
    }
    if let Some(value) = vars.get("TRACKING_ENDPOINT") {
        config.tracking.endpoint = Some(value.trim().to_string());
    }
    if let Some(value) = vars.get("TRACKING_QUEUE_CAPACITY") {
        config.tracking.queue_capacity = parse_number("TRACKING_QUEUE_CAPACITY", value)?;
    }
    if let Some(value) = vars.get("TRACKING_SEND_TIMEOUT") {
        config.tracking.send_timeout = parse_duration("TRACKING_SEND_TIMEOUT", value)?;
    }

    if let Some(value) = vars.get("LOG_LEVEL") {
        config.logging.level = value.trim().to_lowercase();
    }
    if let Some(value) = vars.get("LOG_FORMAT") {
        config.logging.format = value
            .parse::<LogFormat>()
            .map_err(|e| invalid_var("LOG_FORMAT", value, e))?;
    }

    Ok(())
}

fn invalid_var(name: &str, value: &str, reason: impl std::fmt::Display) -> FaultlineError {
    FaultlineError::config_with_context(
        format!("Invalid {}{} value", ENV_PREFIX, name),
        format!("Parsing '{}': {}", value, reason),
    )
}

fn parse_bool(name: &str, value: &str) -> FaultlineResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid_var(name, value, "expected a boolean")),
    }
}

fn parse_number<T>(name: &str, value: &str) -> FaultlineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| invalid_var(name, value, e))
}

fn parse_duration(name: &str, value: &str) -> FaultlineResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim())
        .map_err(|e| invalid_var(name, value, e))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
