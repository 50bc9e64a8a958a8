//! Shared error type across costprism crates.

use thiserror::Error;

/// Stable error codes, used as structured log fields and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Network, auth or throttling failure from the billing API.
    Upstream,
    /// The billing API answered with an unexpected shape.
    MalformedResponse,
    /// Invalid startup configuration.
    Configuration,
    /// Internal fault.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Upstream => "UPSTREAM",
            ErrorCode::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorCode::Configuration => "CONFIGURATION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ExporterError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExporterError::Upstream(_) => ErrorCode::Upstream,
            ExporterError::MalformedResponse(_) => ErrorCode::MalformedResponse,
            ExporterError::Configuration(_) => ErrorCode::Configuration,
            ExporterError::Internal(_) => ErrorCode::Internal,
        }
    }
}
