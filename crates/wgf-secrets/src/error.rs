//! Error types for secret handling and key derivation.

use thiserror::Error;

/// Errors that can occur while deriving keys or encrypting messages.
#[derive(Debug, Error)]
pub enum Error {
    /// No root passphrase was configured.
    #[error("the root passphrase is not set; provide it before using encrypted state")]
    RootPassphraseNotSet,

    /// The persisted salt record is missing or malformed.
    #[error("invalid salt: {reason}")]
    InvalidSalt {
        /// Why the salt was rejected.
        reason: String,
    },

    /// Encryption or decryption failed.
    #[error("encryption error: {reason}")]
    Encryption {
        /// The reason encryption failed.
        reason: String,
    },

    /// Loading or saving a configuration location failed.
    #[error(transparent)]
    Store(#[from] wgf_store::Error),
}

/// Result type alias for secret operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        assert_eq!(
            Error::RootPassphraseNotSet.to_string(),
            "the root passphrase is not set; provide it before using encrypted state"
        );

        let err = Error::InvalidSalt {
            reason: "missing `raw` field".to_string(),
        };
        assert_eq!(err.to_string(), "invalid salt: missing `raw` field");
    }
}
