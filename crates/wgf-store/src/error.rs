//! Error types for configuration storage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while locating, loading, saving or locking configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation on a location failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// The location being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A location was read but its content is malformed.
    #[error("cannot parse {}: {reason}", path.display())]
    Parse {
        /// The location being parsed.
        path: PathBuf,
        /// Why parsing failed.
        reason: String,
    },

    /// Data could not be serialized for a location.
    #[error("cannot serialize data for {}: {reason}", path.display())]
    Serialize {
        /// The destination location.
        path: PathBuf,
        /// Why serialization failed.
        reason: String,
    },

    /// A proxy failed to transform data on its way to or from a location.
    ///
    /// The original error is kept as the source so callers can downcast it.
    #[error("cannot transform data for {}: {source}", path.display())]
    Codec {
        /// The location being loaded or saved.
        path: PathBuf,
        /// The proxy's own error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No loader or saver handles this location.
    #[error("no configuration loader or saver supports {}", path.display())]
    UnsupportedLocation {
        /// The unsupported location.
        path: PathBuf,
    },

    /// The lock could not be acquired in time.
    #[error("timed out after {timeout:?} waiting for lock on {}", path.display())]
    LockTimeout {
        /// The configuration path being locked.
        path: PathBuf,
        /// How long acquisition was attempted.
        timeout: Duration,
    },

    /// The operating system refused the lock operation.
    #[error("cannot lock {}: {reason}", path.display())]
    Lock {
        /// The configuration path being locked.
        path: PathBuf,
        /// The OS error.
        reason: String,
    },
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wraps a proxy's error for `path`, keeping it as the source.
    #[must_use]
    pub fn codec(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Codec {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }

    pub(crate) fn parse(path: &Path, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_location() {
        let err = Error::parse(Path::new("/tmp/state.json"), "expected an object");
        assert_eq!(
            err.to_string(),
            "cannot parse /tmp/state.json: expected an object"
        );

        let err = Error::LockTimeout {
            path: PathBuf::from("/etc/wireguard/wg0.conf"),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 2s waiting for lock on /etc/wireguard/wg0.conf"
        );
    }

    #[test]
    fn codec_error_keeps_the_original_as_source() {
        use std::error::Error as _;

        let err = Error::codec(
            Path::new("/tmp/state.json"),
            std::io::Error::new(std::io::ErrorKind::InvalidData, "bad tag"),
        );
        assert_eq!(
            err.to_string(),
            "cannot transform data for /tmp/state.json: bad tag"
        );
        let source = err.source().expect("source");
        assert_eq!(
            source
                .downcast_ref::<std::io::Error>()
                .map(std::io::Error::kind),
            Some(std::io::ErrorKind::InvalidData)
        );
    }
}
