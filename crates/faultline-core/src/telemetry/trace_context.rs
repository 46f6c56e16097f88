//! W3C trace context (`traceparent`) parsing for trace/metric correlation
//!
//! A `traceparent` header has the form `version-trace_id-parent_id-flags`,
//! e.g. `00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01`. Only
//! version `00` is understood.

use crate::error::{FaultlineError, FaultlineResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Header name carrying the trace context
pub const TRACEPARENT_HEADER: &str = "traceparent";

const SUPPORTED_VERSION: &str = "00";
const TRACE_ID_LEN: usize = 32;
const SPAN_ID_LEN: usize = 16;
const FLAG_SAMPLED: u8 = 0x01;

/// Trace identity extracted from an incoming request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceContext {
    trace_id: String,
    span_id: String,
    flags: u8,
}

impl TraceContext {
    /// Parse a `traceparent` header value
    ///
    /// Ids must be lowercase hex of the exact length and not all zeros.
    pub fn parse_traceparent(value: &str) -> FaultlineResult<Self> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        let [version, trace_id, span_id, flags] = parts.as_slice() else {
            return Err(invalid(format!(
                "expected 4 dash-separated fields, got {}",
                parts.len()
            )));
        };

        if *version != SUPPORTED_VERSION {
            return Err(invalid(format!("unsupported version '{}'", version)));
        }
        check_id("trace id", trace_id, TRACE_ID_LEN)?;
        check_id("parent id", span_id, SPAN_ID_LEN)?;
        if flags.len() != 2 || !is_lower_hex(flags) {
            return Err(invalid(format!("malformed flags '{}'", flags)));
        }
        let flags = u8::from_str_radix(flags, 16)
            .map_err(|e| invalid(format!("malformed flags: {}", e)))?;

        Ok(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            flags,
        })
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn is_sampled(&self) -> bool {
        self.flags & FLAG_SAMPLED != 0
    }

    /// Render back into a `traceparent` header value
    pub fn to_traceparent(&self) -> String {
        format!(
            "{}-{}-{}-{:02x}",
            SUPPORTED_VERSION, self.trace_id, self.span_id, self.flags
        )
    }
}

impl FromStr for TraceContext {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_traceparent(s)
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_traceparent())
    }
}

fn check_id(label: &str, id: &str, len: usize) -> FaultlineResult<()> {
    if id.len() != len || !is_lower_hex(id) {
        return Err(invalid(format!(
            "{} must be {} lowercase hex characters",
            label, len
        )));
    }
    if id.bytes().all(|b| b == b'0') {
        return Err(invalid(format!("{} must not be all zeros", label)));
    }
    Ok(())
}

fn is_lower_hex(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn invalid(reason: String) -> FaultlineError {
    FaultlineError::invalid_input_field(
        TRACEPARENT_HEADER,
        format!("Invalid traceparent: {}", reason),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    const VALID: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_parse_valid_traceparent() {
        let context = TraceContext::parse_traceparent(VALID).unwrap();
        assert_eq!(context.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(context.span_id(), "00f067aa0ba902b7");
        assert!(context.is_sampled());
        assert_eq!(context.to_traceparent(), VALID);

        let unsampled: TraceContext = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00"
            .parse()
            .unwrap();
        assert!(!unsampled.is_sampled());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let context = TraceContext::parse_traceparent(&format!("  {}\n", VALID)).unwrap();
        assert_eq!(context.to_string(), VALID);
    }

    #[test]
    fn test_malformed_traceparent_rejected() {
        let cases = [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
            "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473g-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-1",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-zz",
        ];
        for case in cases {
            let err = TraceContext::parse_traceparent(case).unwrap_err();
            assert_eq!(err.error_code(), "FAULTLINE_INVALID_INPUT", "case {:?}", case);
        }
    }

    #[test]
    fn test_all_zero_ids_rejected() {
        let zero_trace = "00-00000000000000000000000000000000-00f067aa0ba902b7-01";
        let err = TraceContext::parse_traceparent(zero_trace).unwrap_err();
        assert!(err.to_string().contains("trace id must not be all zeros"));

        let zero_span = "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01";
        let err = TraceContext::parse_traceparent(zero_span).unwrap_err();
        assert!(err.to_string().contains("parent id must not be all zeros"));
    }
}
