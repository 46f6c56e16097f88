//! Error types for Faultline
//!
//! Every fallible operation in the workspace returns `FaultlineResult`. The
//! recording hot path is infallible; errors surface only while building
//! configuration, registries and exporters, or from external transports.
//!
//! All errors implement the `UnifiedError` trait which provides consistent fields:
//! - error_code: A unique identifier for programmatic error handling
//! - message: Human-readable error message
//! - context: Optional additional context about where/why the error occurred

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{FaultlineError, FaultlineResult, UnifiedError};
