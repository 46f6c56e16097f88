//! Faultline
//!
//! Structured error codes with bounded, time-bucketed error metrics. This
//! crate re-exports `faultline-core`; see `MetricsContext` for the entry
//! point.

pub use faultline_core::*;
