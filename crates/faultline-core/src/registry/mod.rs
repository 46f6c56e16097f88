//! Error code registry
//!
//! Codes and domains are declared up front through
//! `ErrorCodeRegistryBuilder`; the built registry is read-only and shared.

pub mod builder;
pub mod domain;

pub use builder::{ErrorCodeInfo, ErrorCodeRegistry, ErrorCodeRegistryBuilder, MAX_ERROR_CODE};
pub use domain::{ErrorDomain, PREDEFINED_DOMAINS};
