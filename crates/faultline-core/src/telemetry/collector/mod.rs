//! Error metrics collector: time-bucketed counts plus recent history

mod collector;
mod types;

pub use collector::MetricsCollector;
pub use types::{SharedMetricsCollector, Snapshot, create_metrics_collector};
