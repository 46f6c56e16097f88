//! Snapshot and shared-handle types for the error metrics collector

use super::super::event::EventRecord;
use super::MetricsCollector;
use crate::config::MetricsConfig;
use crate::error::FaultlineResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Point-in-time copy of the aggregate state
///
/// Built fresh on every call and never touched by later writes. Events are
/// shared with the history ring by `Arc`, not deep-copied.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Sum of counts across retained buckets
    pub total_errors: u64,
    /// Per-code counts merged across retained buckets
    pub error_counts: BTreeMap<u32, u64>,
    /// Most recent events, newest first
    pub recent_events: Vec<Arc<EventRecord>>,
    /// Buckets inside the retention window
    pub bucket_count: usize,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Retained count for `code`, zero if never seen
    pub fn count_for(&self, code: u32) -> u64 {
        self.error_counts.get(&code).copied().unwrap_or(0)
    }

    /// Counts by transport status over the recent events
    pub fn status_counts(&self) -> BTreeMap<u16, u64> {
        let mut counts = BTreeMap::new();
        for event in &self.recent_events {
            *counts.entry(event.status_code()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.total_errors == 0 && self.recent_events.is_empty()
    }
}

/// Thread-safe shared metrics collector
pub type SharedMetricsCollector = Arc<MetricsCollector>;

/// Create a shared metrics collector
pub fn create_metrics_collector(config: MetricsConfig) -> FaultlineResult<SharedMetricsCollector> {
    Ok(Arc::new(MetricsCollector::new(config)?))
}
