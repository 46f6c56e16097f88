//! Masking hook for sensitive fields in event details
//!
//! The collector runs its masker on `detail` before an event record is built,
//! so nothing downstream (snapshots, exporters, tracking payloads) ever sees
//! the raw values. Which fields count as sensitive is configuration.

use serde_json::{Map, Value};
use std::fmt::Debug;

/// Replacement for masked string values that look like email addresses
pub const MASKED_EMAIL: &str = "***@***.***";
/// Replacement for all other masked values
pub const MASKED_VALUE: &str = "***";

/// Transforms a detail value before it is stored or forwarded
pub trait DetailMasker: Send + Sync + Debug {
    fn mask(&self, detail: Value) -> Value;
}

/// Leaves details untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMasker;

impl DetailMasker for NoopMasker {
    fn mask(&self, detail: Value) -> Value {
        detail
    }
}

/// Masks object fields whose key contains one of the configured patterns
///
/// Matching is a case-insensitive substring test on the key. Nested objects
/// and arrays are walked; primitives outside a matching key are kept.
#[derive(Debug, Clone, Default)]
pub struct KeyPatternMasker {
    patterns: Vec<String>,
}

impl KeyPatternMasker {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.patterns.iter().any(|p| key.contains(p.as_str()))
    }

    fn mask_value(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.mask_object(map)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.mask_value(v)).collect())
            }
            other => other,
        }
    }

    fn mask_object(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .map(|(key, value)| {
                let masked = if self.is_sensitive(&key) {
                    redact(value)
                } else {
                    self.mask_value(value)
                };
                (key, masked)
            })
            .collect()
    }
}

impl DetailMasker for KeyPatternMasker {
    fn mask(&self, detail: Value) -> Value {
        if self.patterns.is_empty() {
            return detail;
        }
        self.mask_value(detail)
    }
}

fn redact(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.contains('@') => Value::String(MASKED_EMAIL.to_string()),
        _ => Value::String(MASKED_VALUE.to_string()),
    }
}
