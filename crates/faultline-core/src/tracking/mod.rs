//! Error tracking integration
//!
//! Recorded events are forwarded asynchronously to a `TrackingTransport`.
//! Delivery failures are logged and counted, never surfaced to the caller.

pub mod dispatcher;
pub mod payload;
pub mod transport;

pub use dispatcher::{DispatchStats, TrackingDispatcher};
pub use payload::TrackingPayload;
pub use transport::{HttpTransport, LogTransport, TrackingTransport};
