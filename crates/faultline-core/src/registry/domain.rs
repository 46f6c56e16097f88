//! Error domains: named, contiguous code ranges

use crate::error::{FaultlineError, FaultlineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication and authorization failures
pub const AUTH: (&str, u32, u32) = ("AUTH", 200, 299);
/// Missing or conflicting resources
pub const RESOURCE: (&str, u32, u32) = ("RESOURCE", 300, 399);
/// Rejected input
pub const VALIDATION: (&str, u32, u32) = ("VALIDATION", 400, 499);
/// Internal failures
pub const SERVER: (&str, u32, u32) = ("SERVER", 500, 599);
/// Application-defined codes
pub const CUSTOM: (&str, u32, u32) = ("CUSTOM", 900, 999);

/// Domains installed by `ErrorCodeRegistryBuilder::with_predefined_domains`
pub const PREDEFINED_DOMAINS: &[(&str, u32, u32)] = &[AUTH, RESOURCE, VALIDATION, SERVER, CUSTOM];

/// A named, inclusive code range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorDomain {
    name: String,
    start: u32,
    end: u32,
}

impl ErrorDomain {
    /// Fails when the name is blank or `start > end`
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> FaultlineResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FaultlineError::invalid_input_field(
                "domain",
                "Domain name must not be empty",
            ));
        }
        if start > end {
            return Err(FaultlineError::invalid_input_field(
                "domain",
                format!(
                    "Invalid code range for domain '{}': {}..={}, start must be <= end",
                    name, start, end
                ),
            ));
        }
        Ok(Self { name, start, end })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, code: u32) -> bool {
        self.start <= code && code <= self.end
    }

    pub fn overlaps(&self, other: &ErrorDomain) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-{})", self.name, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let domain = ErrorDomain::new("AUTH", 200, 299).unwrap();
        assert!(domain.contains(200));
        assert!(domain.contains(299));
        assert!(!domain.contains(199));
        assert!(!domain.contains(300));
        assert_eq!(domain.to_string(), "AUTH (200-299)");
    }

    #[test]
    fn test_rejects_inverted_range_and_blank_name() {
        assert!(ErrorDomain::new("X", 10, 9).is_err());
        assert!(ErrorDomain::new("  ", 1, 2).is_err());
        assert!(ErrorDomain::new("SINGLE", 5, 5).is_ok());
    }

    #[test]
    fn test_overlap() {
        let a = ErrorDomain::new("A", 100, 199).unwrap();
        let b = ErrorDomain::new("B", 150, 250).unwrap();
        let c = ErrorDomain::new("C", 200, 299).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
