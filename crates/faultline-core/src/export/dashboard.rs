//! JSON query surface over the collector and registry

use crate::error::{FaultlineError, FaultlineResult};
use crate::registry::{ErrorCodeInfo, ErrorCodeRegistry};
use crate::telemetry::{Clock, EventRecord, SharedMetricsCollector};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bounds for `DashboardApi::recent`
pub const RECENT_LIMIT_MAX: usize = 1000;
/// Bounds for `DashboardApi::top_errors`
pub const TOP_ERRORS_LIMIT_MAX: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_errors: u64,
    pub error_counts: BTreeMap<u32, u64>,
    pub bucket_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentEventsResponse {
    pub events: Vec<Arc<EventRecord>>,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeMetrics {
    pub error_code: u32,
    pub count: u64,
    /// Registry metadata, when the code is registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ErrorCodeInfo>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopError {
    pub error_code: u32,
    pub count: u64,
    /// 1-based
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainMetrics {
    pub domain: String,
    pub start: u32,
    pub end: u32,
    pub total_errors: u64,
    pub error_counts: BTreeMap<u32, u64>,
    pub timestamp: String,
}

/// One retained bucket in a time series
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesPoint {
    pub start_time: String,
    pub end_time: String,
    pub total: u64,
    pub error_counts: BTreeMap<u32, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesResponse {
    pub data_points: Vec<TimeSeriesPoint>,
    pub total_errors: u64,
    pub timestamp: String,
}

/// Read-only dashboard queries
///
/// Every call works on data copied out of the collector, so responses are
/// consistent with a single snapshot and can be serialized freely.
#[derive(Debug, Clone)]
pub struct DashboardApi {
    collector: SharedMetricsCollector,
    registry: Arc<ErrorCodeRegistry>,
}

impl DashboardApi {
    pub fn new(collector: SharedMetricsCollector, registry: Arc<ErrorCodeRegistry>) -> Self {
        Self {
            collector,
            registry,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let snapshot = self.collector.snapshot();
        MetricsSummary {
            total_errors: snapshot.total_errors,
            error_counts: snapshot.error_counts,
            bucket_count: snapshot.bucket_count,
            timestamp: rfc3339(snapshot.timestamp),
        }
    }

    /// Most recent events, newest first; `limit` in 1..=1000
    pub fn recent(&self, limit: usize) -> FaultlineResult<RecentEventsResponse> {
        check_limit("limit", limit, RECENT_LIMIT_MAX)?;
        let events = self.collector.recent_events(limit);
        Ok(RecentEventsResponse {
            count: events.len(),
            events,
            timestamp: self.now(),
        })
    }

    pub fn by_code(&self, code: u32) -> CodeMetrics {
        let count = self
            .collector
            .error_counts_by_code()
            .get(&code)
            .copied()
            .unwrap_or(0);
        CodeMetrics {
            error_code: code,
            count,
            info: self.registry.get(code).cloned(),
            timestamp: self.now(),
        }
    }

    /// Codes by count descending, ties broken by code; `limit` in 1..=100
    pub fn top_errors(&self, limit: usize) -> FaultlineResult<Vec<TopError>> {
        check_limit("limit", limit, TOP_ERRORS_LIMIT_MAX)?;
        let mut counts: Vec<(u32, u64)> = self.collector.error_counts_by_code().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(counts
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (code, count))| TopError {
                error_code: code,
                count,
                rank: i + 1,
                error_name: self.registry.get(code).map(|info| info.name.clone()),
            })
            .collect())
    }

    /// Counts for codes inside the named domain
    pub fn by_domain(&self, name: &str) -> FaultlineResult<DomainMetrics> {
        let domain = self.registry.domain(name).ok_or_else(|| {
            FaultlineError::not_found_resource(format!("Unknown error domain '{}'", name), "domain")
        })?;

        let snapshot = self.collector.snapshot();
        let error_counts: BTreeMap<u32, u64> = snapshot
            .error_counts
            .range(domain.start()..=domain.end())
            .map(|(code, count)| (*code, *count))
            .collect();

        Ok(DomainMetrics {
            domain: domain.name().to_string(),
            start: domain.start(),
            end: domain.end(),
            total_errors: error_counts.values().sum(),
            error_counts,
            timestamp: rfc3339(snapshot.timestamp),
        })
    }

    /// Per-bucket counts across the retention window, oldest first
    pub fn timeseries(&self) -> TimeSeriesResponse {
        let data_points: Vec<TimeSeriesPoint> = self
            .collector
            .buckets()
            .into_iter()
            .map(|bucket| TimeSeriesPoint {
                start_time: rfc3339(bucket.start_time),
                end_time: rfc3339(bucket.end_time),
                total: bucket.total_count,
                error_counts: bucket.counts_by_code.into_iter().collect(),
            })
            .collect();

        TimeSeriesResponse {
            total_errors: data_points.iter().map(|p| p.total).sum(),
            data_points,
            timestamp: self.now(),
        }
    }

    pub fn registry(&self) -> &ErrorCodeRegistry {
        &self.registry
    }

    fn now(&self) -> String {
        rfc3339(self.collector.clock().now())
    }
}

fn check_limit(field: &str, limit: usize, max: usize) -> FaultlineResult<()> {
    if limit == 0 || limit > max {
        return Err(FaultlineError::invalid_input_field(
            field,
            format!("{} must be between 1 and {}, got {}", field, max, limit),
        ));
    }
    Ok(())
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
