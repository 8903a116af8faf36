//! CLI error types.

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// HQ state operation failed.
    #[error(transparent)]
    State(#[from] wgf_state::Error),

    /// Key derivation or salt handling failed.
    #[error(transparent)]
    Secrets(#[from] wgf_secrets::Error),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
