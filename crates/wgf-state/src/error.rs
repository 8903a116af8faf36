//! Error types for state management.

use std::path::PathBuf;

use thiserror::Error;
use wgf_wireguard::{InterfaceKind, WireGuardError};

/// Errors that can occur while loading, changing or reconciling HQ state.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration data.
    #[error(transparent)]
    WireGuard(#[from] WireGuardError),

    /// Loading, saving or locking failed.
    #[error(transparent)]
    Store(wgf_store::Error),

    /// Key derivation or encryption failed.
    #[error(transparent)]
    Secrets(#[from] wgf_secrets::Error),

    /// No state has been created yet.
    #[error("state at {} was not bootstrapped, run `wg-federation hq bootstrap` first", path.display())]
    StateNotBootstrapped {
        /// Expected state location.
        path: PathBuf,
    },

    /// The state has no configuration under that name.
    #[error("no {kind} configuration named '{name}'")]
    ConfigurationNotFound {
        /// Kind searched.
        kind: InterfaceKind,
        /// Name searched.
        name: String,
    },

    /// Reconciling one configuration failed.
    #[error("failed to reconcile {kind} configuration '{name}'")]
    Reconciliation {
        /// Kind of the failing configuration.
        kind: InterfaceKind,
        /// Name of the failing configuration.
        name: String,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },
}

/// Secrets errors raised inside the encryption proxies come back as
/// [`Error::Secrets`], so a missing passphrase stays matchable.
impl From<wgf_store::Error> for Error {
    fn from(err: wgf_store::Error) -> Self {
        match err {
            wgf_store::Error::Codec { path, source } => {
                match source.downcast::<wgf_secrets::Error>() {
                    Ok(secrets) => Self::Secrets(*secrets),
                    Err(source) => Self::Store(wgf_store::Error::Codec { path, source }),
                }
            }
            other => Self::Store(other),
        }
    }
}

/// Result type alias for state operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn reconciliation_error_names_configuration_and_keeps_cause() {
        let err = Error::Reconciliation {
            kind: InterfaceKind::Forum,
            name: "wgf-forum0".to_string(),
            source: Box::new(Error::WireGuard(WireGuardError::validation("path", "is required"))),
        };
        assert_eq!(
            err.to_string(),
            "failed to reconcile forums configuration 'wgf-forum0'"
        );
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("invalid path: is required".to_string())
        );
    }

    #[test]
    fn secrets_errors_from_proxies_are_lifted() {
        let err = Error::from(wgf_store::Error::codec(
            std::path::Path::new("/tmp/state.json"),
            wgf_secrets::Error::RootPassphraseNotSet,
        ));
        assert!(matches!(
            err,
            Error::Secrets(wgf_secrets::Error::RootPassphraseNotSet)
        ));

        let err = Error::from(wgf_store::Error::codec(
            std::path::Path::new("/tmp/state.json"),
            std::io::Error::other("unrelated"),
        ));
        assert!(matches!(err, Error::Store(wgf_store::Error::Codec { .. })));
    }

    #[test]
    fn not_bootstrapped_points_at_bootstrap() {
        let err = Error::StateNotBootstrapped {
            path: PathBuf::from("/var/lib/wg-federation/state.json"),
        };
        assert!(err.to_string().contains("hq bootstrap"));
    }
}
