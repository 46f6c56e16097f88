//! Builder and immutable registry of known error codes

use super::domain::{ErrorDomain, PREDEFINED_DOMAINS};
use crate::error::{FaultlineError, FaultlineResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Highest application error code accepted by the registry
pub const MAX_ERROR_CODE: u32 = 9999;

/// Metadata for one registered error code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCodeInfo {
    pub code: u32,
    pub name: String,
    /// Default human-readable message
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Lookup key for localized messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
}

impl ErrorCodeInfo {
    pub fn new(
        code: u32,
        name: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            message: message.into(),
            status_code,
            domain: None,
            message_key: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }
}

/// Collects domains and codes, validating everything at `build`
#[derive(Debug, Default)]
pub struct ErrorCodeRegistryBuilder {
    domains: Vec<(String, u32, u32)>,
    codes: Vec<ErrorCodeInfo>,
}

impl ErrorCodeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add AUTH, RESOURCE, VALIDATION, SERVER and CUSTOM
    pub fn with_predefined_domains(mut self) -> Self {
        self.domains.extend(
            PREDEFINED_DOMAINS
                .iter()
                .map(|(name, start, end)| (name.to_string(), *start, *end)),
        );
        self
    }

    /// Declare a domain covering `start..=end`
    pub fn domain(mut self, name: impl Into<String>, start: u32, end: u32) -> Self {
        self.domains.push((name.into(), start, end));
        self
    }

    pub fn register(mut self, info: ErrorCodeInfo) -> Self {
        self.codes.push(info);
        self
    }

    pub fn register_all(mut self, infos: impl IntoIterator<Item = ErrorCodeInfo>) -> Self {
        self.codes.extend(infos);
        self
    }

    /// Validate and freeze
    pub fn build(self) -> FaultlineResult<ErrorCodeRegistry> {
        let mut domains: Vec<ErrorDomain> = Vec::with_capacity(self.domains.len());
        let mut domain_names = HashSet::new();
        for (name, start, end) in self.domains {
            if !domain_names.insert(name.clone()) {
                return Err(FaultlineError::invalid_input_field(
                    "domain",
                    format!("Domain '{}' is already registered", name),
                ));
            }
            domains.push(ErrorDomain::new(name, start, end)?);
        }
        domains.sort_by_key(|d| (d.start(), d.end()));

        let mut codes = BTreeMap::new();
        for info in self.codes {
            validate_code(&info, &domains)?;
            let code = info.code;
            if let Some(existing) = codes.insert(code, info) {
                return Err(FaultlineError::invalid_input_field(
                    "error_code",
                    format!(
                        "Error code {} is already registered by '{}'",
                        code, existing.name
                    ),
                ));
            }
        }

        tracing::debug!(
            codes = codes.len(),
            domains = domains.len(),
            "error code registry built"
        );
        Ok(ErrorCodeRegistry { codes, domains })
    }
}

fn validate_code(info: &ErrorCodeInfo, domains: &[ErrorDomain]) -> FaultlineResult<()> {
    if info.code > MAX_ERROR_CODE {
        return Err(FaultlineError::invalid_input_field(
            "error_code",
            format!(
                "Error code {} is out of range 0..={}",
                info.code, MAX_ERROR_CODE
            ),
        ));
    }
    if !(100..=599).contains(&info.status_code) {
        return Err(FaultlineError::invalid_input_field(
            "status_code",
            format!(
                "Status code {} for error {} must be within 100..=599",
                info.status_code, info.code
            ),
        ));
    }
    if let Some(name) = &info.domain {
        let domain = domains.iter().find(|d| d.name() == name).ok_or_else(|| {
            FaultlineError::invalid_input_field(
                "domain",
                format!("Error {} references unknown domain '{}'", info.code, name),
            )
        })?;
        if !domain.contains(info.code) {
            return Err(FaultlineError::invalid_input_field(
                "error_code",
                format!("Error code {} is outside domain {}", info.code, domain),
            ));
        }
    }
    Ok(())
}

/// Immutable lookup of registered codes and domains
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeRegistry {
    codes: BTreeMap<u32, ErrorCodeInfo>,
    domains: Vec<ErrorDomain>,
}

impl ErrorCodeRegistry {
    pub fn builder() -> ErrorCodeRegistryBuilder {
        ErrorCodeRegistryBuilder::new()
    }

    pub fn get(&self, code: u32) -> Option<&ErrorCodeInfo> {
        self.codes.get(&code)
    }

    pub fn contains(&self, code: u32) -> bool {
        self.codes.contains_key(&code)
    }

    /// Registered codes in ascending order
    pub fn codes(&self) -> Vec<u32> {
        self.codes.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }

    pub fn domain(&self, name: &str) -> Option<&ErrorDomain> {
        self.domains.iter().find(|d| d.name() == name)
    }

    /// First domain, by range start, that contains `code`
    pub fn domain_for_code(&self, code: u32) -> Option<&ErrorDomain> {
        self.domains.iter().find(|d| d.contains(code))
    }

    /// Domains ordered by range start
    pub fn domains(&self) -> &[ErrorDomain] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
