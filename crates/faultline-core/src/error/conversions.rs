//! From trait implementations for FaultlineError conversions

use super::types::FaultlineError;

impl From<std::io::Error> for FaultlineError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for FaultlineError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<toml::de::Error> for FaultlineError {
    fn from(error: toml::de::Error) -> Self {
        Self::config_with_context(error.to_string(), "Deserializing TOML configuration")
    }
}

impl From<toml::ser::Error> for FaultlineError {
    fn from(error: toml::ser::Error) -> Self {
        Self::other(format!("Failed to serialize TOML: {}", error))
    }
}

impl From<reqwest::Error> for FaultlineError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let url = error.url().map(|u| u.to_string());
        Self::Http {
            message: error.to_string(),
            url,
            status_code,
            context: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_io_conversion() {
        let err: FaultlineError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.error_code(), "FAULTLINE_IO");
        assert!(err.message().contains("missing"));
    }

    #[test]
    fn test_json_conversion() {
        let err: FaultlineError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), "FAULTLINE_JSON");
    }

    #[test]
    fn test_toml_conversion_is_config_error() {
        let err: FaultlineError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(err.is_config());
        assert!(err.context().is_some());
    }
}
