//! Error occurrence input and the immutable event record

use super::trace_context::TraceContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Input to `MetricsCollector::record`
///
/// Required fields go through `new`; optional request metadata and detail
/// are attached with the `with_*` builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOccurrence {
    pub error_code: u32,
    pub error_name: String,
    pub status_code: u16,
    pub message: String,
    pub detail: Option<Value>,
    pub path: Option<String>,
    pub method: Option<String>,
    /// Trace the error happened under, for correlating metrics with traces
    pub trace_id: Option<String>,
}

impl ErrorOccurrence {
    pub fn new(
        error_code: u32,
        error_name: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_code,
            error_name: error_name.into(),
            status_code,
            message: message.into(),
            detail: None,
            path: None,
            method: None,
            trace_id: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_trace_context(self, context: &TraceContext) -> Self {
        self.with_trace_id(context.trace_id())
    }

    /// Correlate with the trace named by a `traceparent` header value
    ///
    /// A malformed header leaves the occurrence uncorrelated; recording
    /// must not fail on bad request metadata.
    pub fn with_traceparent(self, header: &str) -> Self {
        match TraceContext::parse_traceparent(header) {
            Ok(context) => self.with_trace_context(&context),
            Err(e) => {
                tracing::trace!("ignoring traceparent: {}", e);
                self
            }
        }
    }
}

/// One recorded error occurrence
///
/// Never mutated after construction. Shared as `Arc<EventRecord>` between the
/// history ring, snapshots and the tracking dispatcher; `detail` is shared by
/// reference as well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    error_code: u32,
    error_name: String,
    status_code: u16,
    message: String,
    detail: Option<Arc<Value>>,
    path: Option<String>,
    method: Option<String>,
    trace_id: Option<String>,
    timestamp: DateTime<Utc>,
    event_id: String,
}

impl EventRecord {
    /// Build a record stamped with `timestamp` and a fresh event id
    ///
    /// Blank `path`/`method` and a JSON `null` detail are treated as absent.
    pub fn new(occurrence: ErrorOccurrence, timestamp: DateTime<Utc>) -> Self {
        let ErrorOccurrence {
            error_code,
            error_name,
            status_code,
            message,
            detail,
            path,
            method,
            trace_id,
        } = occurrence;

        Self {
            error_code,
            error_name,
            status_code,
            message,
            detail: detail.filter(|d| !d.is_null()).map(Arc::new),
            path: non_blank(path),
            method: non_blank(method).map(|m| m.to_uppercase()),
            trace_id: non_blank(trace_id),
            timestamp,
            event_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn error_code(&self) -> u32 {
        self.error_code
    }

    pub fn error_name(&self) -> &str {
        &self.error_name
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shared handle to the (already masked) detail
    pub fn detail(&self) -> Option<&Arc<Value>> {
        self.detail.as_ref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_occurrence() {
        let now = Utc::now();
        let record = EventRecord::new(
            ErrorOccurrence::new(404, "NotFound", 404, "not found")
                .with_path("/users/7")
                .with_method("get")
                .with_detail(json!({"id": 7})),
            now,
        );

        assert_eq!(record.error_code(), 404);
        assert_eq!(record.error_name(), "NotFound");
        assert_eq!(record.status_code(), 404);
        assert_eq!(record.path(), Some("/users/7"));
        assert_eq!(record.method(), Some("GET"));
        assert_eq!(record.detail().map(|d| d["id"].clone()), Some(json!(7)));
        assert_eq!(record.timestamp(), now);
        assert!(uuid::Uuid::parse_str(record.event_id()).is_ok());
    }

    #[test]
    fn test_malformed_optionals_become_absent() {
        let record = EventRecord::new(
            ErrorOccurrence::new(1, "X", 500, "x")
                .with_path("   ")
                .with_method("")
                .with_detail(Value::Null),
            Utc::now(),
        );

        assert!(record.path().is_none());
        assert!(record.method().is_none());
        assert!(record.detail().is_none());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let now = Utc::now();
        let a = EventRecord::new(ErrorOccurrence::new(1, "X", 500, "x"), now);
        let b = EventRecord::new(ErrorOccurrence::new(1, "X", 500, "x"), now);
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn test_serializes_flat_json() {
        let record = EventRecord::new(ErrorOccurrence::new(7, "Boom", 500, "boom"), Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["error_code"], 7);
        assert_eq!(value["status_code"], 500);
        assert!(value["event_id"].is_string());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(value["detail"].is_null());
        assert!(value["trace_id"].is_null());
    }

    #[test]
    fn test_traceparent_correlates_record() {
        let record = EventRecord::new(
            ErrorOccurrence::new(500, "Internal", 500, "boom")
                .with_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
            Utc::now(),
        );
        assert_eq!(record.trace_id(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["trace_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
    }

    #[test]
    fn test_malformed_traceparent_leaves_record_uncorrelated() {
        let occurrence = ErrorOccurrence::new(500, "Internal", 500, "boom")
            .with_traceparent("00-00000000000000000000000000000000-00f067aa0ba902b7-01");
        assert!(occurrence.trace_id.is_none());

        let record = EventRecord::new(occurrence.with_trace_id("  "), Utc::now());
        assert!(record.trace_id().is_none());
    }
}
