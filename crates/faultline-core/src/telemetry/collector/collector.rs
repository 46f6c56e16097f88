//! Core error metrics collector implementation

use super::super::bucket::{BucketInsert, TimeBucket, TimeBucketStore};
use super::super::clock::{Clock, SystemClock};
use super::super::event::{ErrorOccurrence, EventRecord};
use super::super::history::RecentHistoryRing;
use super::types::Snapshot;
use crate::config::MetricsConfig;
use crate::error::FaultlineResult;
use crate::masking::{DetailMasker, KeyPatternMasker};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything guarded by the collector's single lock
#[derive(Debug)]
struct CollectorState {
    buckets: TimeBucketStore,
    history: RecentHistoryRing<Arc<EventRecord>>,
    total_events: u64,
}

/// Aggregates error occurrences into time buckets and a bounded history
///
/// `record` is the hot path: no I/O, one short lock acquisition, never fails.
/// Readers take the same lock only long enough to copy state out.
#[derive(Debug)]
pub struct MetricsCollector {
    config: MetricsConfig,
    state: Mutex<CollectorState>,
    clock: Arc<dyn Clock>,
    masker: Arc<dyn DetailMasker>,
}

impl MetricsCollector {
    /// Create a collector from a validated configuration
    ///
    /// Uses the system clock and masks details with the configured
    /// `pii_patterns`.
    pub fn new(config: MetricsConfig) -> FaultlineResult<Self> {
        config.validate()?;
        let buckets = TimeBucketStore::new(config.bucket_width, config.retention_window)?;
        let history = RecentHistoryRing::new(config.max_events);
        let masker = KeyPatternMasker::new(&config.pii_patterns);

        Ok(Self {
            config,
            state: Mutex::new(CollectorState {
                buckets,
                history,
                total_events: 0,
            }),
            clock: Arc::new(SystemClock),
            masker: Arc::new(masker),
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the detail masker
    pub fn with_masker(mut self, masker: Arc<dyn DetailMasker>) -> Self {
        self.masker = masker;
        self
    }

    /// Record one error occurrence and return its event id
    pub fn record(&self, occurrence: ErrorOccurrence) -> String {
        self.record_event(occurrence).event_id().to_string()
    }

    /// Record one error occurrence and return the shared record
    ///
    /// When the collector is disabled the record is still built, so callers
    /// get an id, but nothing is stored.
    pub fn record_event(&self, mut occurrence: ErrorOccurrence) -> Arc<EventRecord> {
        occurrence.detail = occurrence.detail.map(|detail| self.masker.mask(detail));
        let now = self.clock.now();
        let event = Arc::new(EventRecord::new(occurrence, now));

        if !self.config.enabled {
            return event;
        }

        let evicted = {
            let mut state = self.state.lock();
            if state.buckets.insert(event.error_code(), now, now) == BucketInsert::Dropped {
                tracing::trace!(
                    error_code = event.error_code(),
                    "event behind evicted horizon, kept in history only"
                );
            }
            state.total_events += 1;
            state.history.push(Arc::clone(&event))
        };
        // Release the evicted record outside the lock.
        drop(evicted);

        event
    }

    /// Copy out totals, per-code counts and recent events
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let (totals, recent_events) = {
            let state = self.state.lock();
            (state.buckets.totals(now), state.history.snapshot())
        };

        Snapshot {
            total_errors: totals.total_count,
            error_counts: totals.counts_by_code,
            recent_events,
            bucket_count: totals.bucket_count,
            timestamp: now,
        }
    }

    /// Per-code counts over the retained buckets
    pub fn error_counts_by_code(&self) -> BTreeMap<u32, u64> {
        let now = self.clock.now();
        self.state.lock().buckets.totals(now).counts_by_code
    }

    /// Up to `limit` most recent events, newest first
    pub fn recent_events(&self, limit: usize) -> Vec<Arc<EventRecord>> {
        if limit == 0 {
            return Vec::new();
        }
        self.state.lock().history.snapshot_slice(limit)
    }

    /// Copies of the retained buckets, oldest first
    pub fn buckets(&self) -> Vec<TimeBucket> {
        let now = self.clock.now();
        self.state.lock().buckets.retained(now)
    }

    /// Number of `record` calls since construction or the last `clear`
    pub fn total_events(&self) -> u64 {
        self.state.lock().total_events
    }

    /// Events kept in history but excluded from bucket counts
    pub fn dropped_from_aggregation(&self) -> u64 {
        self.state.lock().buckets.dropped()
    }

    /// Reset buckets, history and counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.buckets.clear();
        state.history.clear();
        state.total_events = 0;
        tracing::debug!("error metrics cleared");
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn masker(&self) -> &Arc<dyn DetailMasker> {
        &self.masker
    }
}
