//! Error types for `WireGuard` configuration values.

use thiserror::Error;

/// Errors that can occur while building or encoding `WireGuard` configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireGuardError {
    /// A configuration value failed validation.
    #[error("invalid {field}: {reason}")]
    DataValidation {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid key format.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),
}

impl WireGuardError {
    /// Builds a [`WireGuardError::DataValidation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for `WireGuard` configuration operations.
pub type Result<T> = std::result::Result<T, WireGuardError>;
