//! Metrics configuration model

use super::logging_config::LoggingConfig;
use super::validation::ConfigValidator;
use crate::error::FaultlineResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Field-name patterns masked in event details by default
pub const DEFAULT_PII_PATTERNS: &[&str] = &[
    "email",
    "password",
    "ssn",
    "credit_card",
    "api_key",
    "token",
    "secret",
    "phone",
];

/// Configuration for error metrics collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable/disable metrics collection
    pub enabled: bool,
    /// Width of each aggregation bucket
    #[serde(with = "humantime_serde")]
    pub bucket_width: Duration,
    /// How long bucket counts are retained
    #[serde(with = "humantime_serde")]
    pub retention_window: Duration,
    /// Capacity of the recent-events ring
    pub max_events: usize,
    /// Enable dashboard query API
    pub dashboard_enabled: bool,
    /// Field-name substrings masked in event details
    pub pii_patterns: Vec<String>,
    /// Pull-based exposition exporter
    pub exposition: ExpositionConfig,
    /// Fire-and-forget error tracking integration
    pub tracking: TrackingConfig,
    /// Logging settings for binaries embedding the engine
    pub logging: LoggingConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket_width: Duration::from_secs(60),
            retention_window: Duration::from_secs(300),
            max_events: 10_000,
            dashboard_enabled: true,
            pii_patterns: DEFAULT_PII_PATTERNS.iter().map(|p| p.to_string()).collect(),
            exposition: ExpositionConfig::default(),
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MetricsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> FaultlineResult<()> {
        ConfigValidator::validate(self)
    }

    /// Set the bucket width
    pub fn with_bucket_width(mut self, width: Duration) -> Self {
        self.bucket_width = width;
        self
    }

    /// Set the retention window
    pub fn with_retention_window(mut self, window: Duration) -> Self {
        self.retention_window = window;
        self
    }

    /// Set the recent-events ring capacity
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Upper bound on the number of buckets retained at once
    ///
    /// A bucket ending exactly at the retention horizon is still retained, so
    /// a full window can span `retention / width + 2` bucket starts.
    pub fn max_buckets(&self) -> usize {
        let width = self.bucket_width.as_millis().max(1);
        let retention = self.retention_window.as_millis();
        usize::try_from(retention / width)
            .unwrap_or(usize::MAX)
            .saturating_add(2)
    }
}

/// Exposition exporter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpositionConfig {
    pub enabled: bool,
    /// Metric name prefix
    pub namespace: String,
}

impl Default for ExpositionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "faultline".to_string(),
        }
    }
}

/// Error tracking integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,
    /// Endpoint receiving tracking payloads over HTTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bounded queue size between `record()` and the worker
    pub queue_capacity: usize,
    /// Per-payload send timeout
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
    /// Severity level attached to payloads
    pub level: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            queue_capacity: 1024,
            send_timeout: Duration::from_secs(5),
            level: "error".to_string(),
        }
    }
}
