//! Snapshot consumers: text exposition and dashboard queries

pub mod dashboard;
pub mod exposition;

pub use dashboard::{
    CodeMetrics, DashboardApi, DomainMetrics, MetricsSummary, RecentEventsResponse,
    TimeSeriesPoint, TimeSeriesResponse, TopError,
};
pub use exposition::{EXPOSITION_CONTENT_TYPE, ExpositionExporter};
