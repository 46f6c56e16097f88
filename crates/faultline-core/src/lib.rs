//! Faultline Core Library
//!
//! Error metrics aggregation: every error occurrence is recorded into
//! time-bucketed counts and a bounded recent-history ring, then served to
//! an exposition exporter, a dashboard query API and an asynchronous
//! error tracking integration.

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod masking;
pub mod registry;
pub mod telemetry;
pub mod tracking;

// Re-export commonly used types
pub use config::{LogFormat, LoggingConfig, MetricsConfig, MetricsPreset};
pub use context::{MetricsContext, MetricsContextBuilder};
pub use error::{FaultlineError, FaultlineResult, UnifiedError};
pub use export::{DashboardApi, ExpositionExporter};
pub use masking::{DetailMasker, KeyPatternMasker, NoopMasker};
pub use registry::{ErrorCodeInfo, ErrorCodeRegistry, ErrorCodeRegistryBuilder, ErrorDomain};
pub use telemetry::{
    Clock, ErrorOccurrence, EventRecord, ManualClock, MetricsCollector, SharedMetricsCollector,
    Snapshot, SystemClock, TimeBucket, TraceContext,
};
pub use tracking::{
    DispatchStats, HttpTransport, LogTransport, TrackingDispatcher, TrackingPayload,
    TrackingTransport,
};
