//! Fire-and-forget delivery of recorded events to a tracking transport
//!
//! `dispatch` only ever does a `try_send` into a bounded channel, so the
//! error path never waits on the network. A single worker task owns the
//! receiving end and calls the transport.

use super::payload::TrackingPayload;
use super::transport::TrackingTransport;
use crate::error::{FaultlineError, FaultlineResult};
use crate::masking::DetailMasker;
use crate::telemetry::EventRecord;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Point-in-time dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Accepted into the queue
    pub queued: u64,
    /// Delivered by the transport
    pub sent: u64,
    /// Rejected by the transport
    pub failed: u64,
    /// Refused because the queue was full or closed
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct DispatchCounters {
    queued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl DispatchCounters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            queued: self.queued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Bounded queue plus one worker task forwarding events to a transport
pub struct TrackingDispatcher {
    sender: mpsc::Sender<Arc<EventRecord>>,
    counters: Arc<DispatchCounters>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    transport_name: &'static str,
}

impl std::fmt::Debug for TrackingDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingDispatcher")
            .field("transport", &self.transport_name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl TrackingDispatcher {
    /// Start the worker on the current tokio runtime
    ///
    /// Fails with a runtime error when called outside a runtime.
    pub fn spawn(
        transport: Arc<dyn TrackingTransport>,
        masker: Arc<dyn DetailMasker>,
        capacity: usize,
        level: impl Into<String>,
    ) -> FaultlineResult<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            FaultlineError::runtime(format!(
                "Tracking dispatcher requires a tokio runtime: {}",
                e
            ))
        })?;

        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let counters = Arc::new(DispatchCounters::default());
        let cancel = CancellationToken::new();
        let transport_name = transport.name();

        let worker = Worker {
            receiver,
            transport,
            masker,
            level: level.into(),
            counters: Arc::clone(&counters),
            cancel: cancel.clone(),
        };
        let join = handle.spawn(worker.run());

        tracing::debug!(transport = transport_name, capacity, "tracking dispatcher started");

        Ok(Self {
            sender,
            counters,
            cancel,
            worker: Mutex::new(Some(join)),
            transport_name,
        })
    }

    /// Queue `event` without waiting; returns false if it was dropped
    pub fn dispatch(&self, event: Arc<EventRecord>) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(event_id = event.event_id(), "tracking queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(event_id = event.event_id(), "tracking dispatcher closed, event dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport_name
    }

    /// Stop accepting work, deliver what is already queued, then join
    ///
    /// Calling it more than once is a no-op after the first call.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let join = self.worker.lock().take();
        if let Some(join) = join {
            if let Err(e) = join.await {
                tracing::warn!("Tracking worker ended abnormally: {}", e);
            }
            let stats = self.stats();
            tracing::debug!(
                sent = stats.sent,
                failed = stats.failed,
                dropped = stats.dropped,
                "tracking dispatcher stopped"
            );
        }
    }
}

struct Worker {
    receiver: mpsc::Receiver<Arc<EventRecord>>,
    transport: Arc<dyn TrackingTransport>,
    masker: Arc<dyn DetailMasker>,
    level: String,
    counters: Arc<DispatchCounters>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(event) => self.deliver(&event).await,
                    None => return,
                },
            }
        }

        // Cancelled: refuse new items and flush the backlog.
        self.receiver.close();
        while let Ok(event) = self.receiver.try_recv() {
            self.deliver(&event).await;
        }
    }

    async fn deliver(&self, event: &EventRecord) {
        let payload = TrackingPayload::from_event(event, self.masker.as_ref(), &self.level);
        match self.transport.send(&payload).await {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    transport = self.transport.name(),
                    event_id = event.event_id(),
                    "Failed to deliver tracked error: {}",
                    e
                );
            }
        }
    }
}
