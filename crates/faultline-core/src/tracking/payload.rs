//! Payload sent to the error tracking backend

use crate::masking::DetailMasker;
use crate::telemetry::EventRecord;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// One tracked error as it goes over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPayload {
    pub event_id: String,
    pub level: String,
    /// `"[<error_name>] <message>"`
    pub message: String,
    pub extra: Map<String, Value>,
    pub tags: BTreeMap<String, String>,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl TrackingPayload {
    /// Build from a recorded event, masking its detail once more
    pub fn from_event(event: &EventRecord, masker: &dyn DetailMasker, level: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("error_code".to_string(), json!(event.error_code()));
        extra.insert("error_name".to_string(), json!(event.error_name()));
        extra.insert("status_code".to_string(), json!(event.status_code()));
        extra.insert("event_id".to_string(), json!(event.event_id()));
        if let Some(path) = event.path() {
            extra.insert("path".to_string(), json!(path));
        }
        if let Some(method) = event.method() {
            extra.insert("method".to_string(), json!(method));
        }
        if let Some(trace_id) = event.trace_id() {
            extra.insert("trace_id".to_string(), json!(trace_id));
        }
        if let Some(detail) = event.detail() {
            extra.insert("detail".to_string(), masker.mask(detail.as_ref().clone()));
        }

        let mut tags = BTreeMap::from([
            ("error_code".to_string(), event.error_code().to_string()),
            ("error_name".to_string(), event.error_name().to_string()),
        ]);
        if let Some(trace_id) = event.trace_id() {
            tags.insert("trace_id".to_string(), trace_id.to_string());
        }

        Self {
            event_id: event.event_id().to_string(),
            level: level.to_string(),
            message: format!("[{}] {}", event.error_name(), event.message()),
            extra,
            tags,
            timestamp: event
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
