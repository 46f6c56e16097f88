//! Error telemetry: event records, bucketed aggregation and recent history
//!
//! `MetricsCollector` is the façade; the bucket store and history ring are
//! plain data structures it guards with a single lock.

pub mod bucket;
pub mod clock;
pub mod collector;
pub mod event;
pub mod history;
pub mod trace_context;

pub use bucket::{BucketInsert, BucketTotals, TimeBucket, TimeBucketStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::{MetricsCollector, SharedMetricsCollector, Snapshot, create_metrics_collector};
pub use event::{ErrorOccurrence, EventRecord};
pub use history::RecentHistoryRing;
pub use trace_context::{TRACEPARENT_HEADER, TraceContext};
