// src/error.rs

//! Unified error handling for the harvesting client.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Caller supplied an unusable query spec. Never retried.
    #[error("Invalid query spec: {0}")]
    InvalidSpec(String),

    /// Upstream rejected the credential or forbade access. Never retried.
    #[error("Fatal upstream response (HTTP {status}) for {context}")]
    Fatal { status: u16, context: String },

    /// Retry budget spent without a successful response.
    #[error("Retries exhausted after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Response bytes could not be decoded with any known encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A single record was missing a required field. The batch survives.
    #[error("Malformed {kind} record: missing required field '{field}'")]
    MalformedRecord { kind: String, field: String },

    /// Cooperative cancellation was observed.
    #[error("Cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an invalid-spec error.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec(message.into())
    }

    /// Create a fatal upstream error with context.
    pub fn fatal(status: u16, context: impl Into<String>) -> Self {
        Self::Fatal {
            status,
            context: context.into(),
        }
    }

    /// Create a retries-exhausted error from the last observed cause.
    pub fn retries_exhausted(attempts: u32, last: impl fmt::Display) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: last.to_string(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a malformed-record error.
    pub fn malformed_record(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error terminates a whole harvest run.
    ///
    /// Per-page failures are contained by the pagination driver; only
    /// these variants abort the collection as a whole.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Fatal { .. } | Self::Cancelled | Self::InvalidSpec(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_and_cancelled_are_terminal() {
        assert!(AppError::fatal(401, "page 1").is_terminal());
        assert!(AppError::Cancelled.is_terminal());
        assert!(AppError::invalid_spec("empty keyword").is_terminal());
    }

    #[test]
    fn page_level_failures_are_contained() {
        assert!(!AppError::retries_exhausted(5, "HTTP 503").is_terminal());
        assert!(!AppError::encoding("undecodable body").is_terminal());
        assert!(!AppError::malformed_record("product", "title").is_terminal());
    }
}
