//! MetricsContext - explicit wiring of collector, registry and consumers
//!
//! Build one context at startup and share it behind an `Arc`. Nothing in the
//! crate keeps process-wide state, so independent contexts never interfere.

use crate::config::MetricsConfig;
use crate::error::{FaultlineError, FaultlineResult};
use crate::export::{DashboardApi, ExpositionExporter};
use crate::masking::{DetailMasker, KeyPatternMasker};
use crate::registry::ErrorCodeRegistry;
use crate::telemetry::{Clock, ErrorOccurrence, MetricsCollector, SharedMetricsCollector};
use crate::tracking::{DispatchStats, HttpTransport, TrackingDispatcher, TrackingTransport};
use std::sync::Arc;

/// Builder for `MetricsContext`
pub struct MetricsContextBuilder {
    config: MetricsConfig,
    registry: Option<Arc<ErrorCodeRegistry>>,
    clock: Option<Arc<dyn Clock>>,
    masker: Option<Arc<dyn DetailMasker>>,
    transport: Option<Arc<dyn TrackingTransport>>,
}

impl MetricsContextBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            registry: None,
            clock: None,
            masker: None,
            transport: None,
        }
    }

    /// Registry used by the dashboard; defaults to an empty one
    pub fn registry(mut self, registry: impl Into<Arc<ErrorCodeRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Masker for stored details and tracking payloads; defaults to the
    /// configured `pii_patterns`
    pub fn masker(mut self, masker: Arc<dyn DetailMasker>) -> Self {
        self.masker = Some(masker);
        self
    }

    /// Transport for tracking; defaults to HTTP against `tracking.endpoint`
    pub fn transport(mut self, transport: Arc<dyn TrackingTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and wire every component
    ///
    /// Spawning the tracking worker needs a tokio runtime, so a context with
    /// tracking enabled must be built from inside one.
    pub fn build(self) -> FaultlineResult<MetricsContext> {
        let config = self.config;
        config.validate()?;

        let masker: Arc<dyn DetailMasker> = self
            .masker
            .unwrap_or_else(|| Arc::new(KeyPatternMasker::new(&config.pii_patterns)));

        let mut collector = MetricsCollector::new(config.clone())?.with_masker(Arc::clone(&masker));
        if let Some(clock) = self.clock {
            collector = collector.with_clock(clock);
        }
        let collector: SharedMetricsCollector = Arc::new(collector);

        let registry = self.registry.unwrap_or_default();
        let exporter = ExpositionExporter::new(Arc::clone(&collector), &config.exposition);
        let dashboard = config
            .dashboard_enabled
            .then(|| DashboardApi::new(Arc::clone(&collector), Arc::clone(&registry)));

        let dispatcher = if config.tracking.enabled {
            let transport = match self.transport {
                Some(transport) => transport,
                None => default_transport(&config)?,
            };
            Some(TrackingDispatcher::spawn(
                transport,
                Arc::clone(&masker),
                config.tracking.queue_capacity,
                config.tracking.level.clone(),
            )?)
        } else {
            None
        };

        tracing::info!(
            enabled = config.enabled,
            bucket_width = ?config.bucket_width,
            retention_window = ?config.retention_window,
            max_events = config.max_events,
            registered_codes = registry.len(),
            tracking = dispatcher.as_ref().map(|d| d.transport_name()),
            "metrics context built"
        );

        Ok(MetricsContext {
            config,
            collector,
            registry,
            exporter,
            dashboard,
            dispatcher,
        })
    }
}

fn default_transport(config: &MetricsConfig) -> FaultlineResult<Arc<dyn TrackingTransport>> {
    let endpoint = config.tracking.endpoint.as_deref().ok_or_else(|| {
        FaultlineError::config_field(
            "tracking.endpoint",
            "Tracking is enabled but no endpoint or transport was provided",
        )
    })?;
    Ok(Arc::new(HttpTransport::new(
        endpoint,
        config.tracking.send_timeout,
    )?))
}

/// Everything needed to record errors and serve their metrics
#[derive(Debug)]
pub struct MetricsContext {
    config: MetricsConfig,
    collector: SharedMetricsCollector,
    registry: Arc<ErrorCodeRegistry>,
    exporter: ExpositionExporter,
    dashboard: Option<DashboardApi>,
    dispatcher: Option<TrackingDispatcher>,
}

impl MetricsContext {
    pub fn builder(config: MetricsConfig) -> MetricsContextBuilder {
        MetricsContextBuilder::new(config)
    }

    /// Record an occurrence and hand it to tracking without waiting
    pub fn record(&self, occurrence: ErrorOccurrence) -> String {
        let event = self.collector.record_event(occurrence);
        let event_id = event.event_id().to_string();
        if !self.collector.is_enabled() {
            return event_id;
        }
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(event);
        }
        event_id
    }

    pub fn collector(&self) -> &SharedMetricsCollector {
        &self.collector
    }

    pub fn registry(&self) -> &Arc<ErrorCodeRegistry> {
        &self.registry
    }

    pub fn exporter(&self) -> &ExpositionExporter {
        &self.exporter
    }

    /// `None` when `dashboard_enabled` is off
    pub fn dashboard(&self) -> Option<&DashboardApi> {
        self.dashboard.as_ref()
    }

    /// `None` when tracking is off
    pub fn tracking_stats(&self) -> Option<DispatchStats> {
        self.dispatcher.as_ref().map(TrackingDispatcher::stats)
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Flush pending tracking deliveries and stop the worker
    pub async fn shutdown(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.shutdown().await;
        }
        tracing::info!(
            total_events = self.collector.total_events(),
            "metrics context shut down"
        );
    }
}
