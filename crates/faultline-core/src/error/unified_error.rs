//! UnifiedError trait implementation for FaultlineError

use super::types::{FaultlineError, UnifiedError};

impl UnifiedError for FaultlineError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "FAULTLINE_CONFIG",
            Self::InvalidInput { .. } => "FAULTLINE_INVALID_INPUT",
            Self::NotFound { .. } => "FAULTLINE_NOT_FOUND",
            Self::Io { .. } => "FAULTLINE_IO",
            Self::Json { .. } => "FAULTLINE_JSON",
            Self::Http { .. } => "FAULTLINE_HTTP",
            Self::Runtime { .. } => "FAULTLINE_RUNTIME",
            Self::Other { .. } => "FAULTLINE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::NotFound { message, .. }
            | Self::Io { message, .. }
            | Self::Json { message, .. }
            | Self::Http { message, .. }
            | Self::Runtime { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::NotFound { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Http { context, .. }
            | Self::Runtime { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status_code, .. } => status_code.is_none_or(|s| s >= 500 || s == 429),
            Self::Io { .. } => true,
            _ => false,
        }
    }
}
