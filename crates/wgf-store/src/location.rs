//! Well-known locations of wg-federation files.

use std::path::{Path, PathBuf};

/// Name of the application directory below the user data directory.
const APPLICATION_NAME: &str = "wg-federation";

/// State directory used when no user data directory can be resolved.
const FALLBACK_STATE_DIRECTORY: &str = "/var/lib/wg-federation";

/// Directory holding `WireGuard` interface configuration files.
const DEFAULT_WIREGUARD_DIRECTORY: &str = "/etc/wireguard";

/// Resolves where wg-federation reads and writes its files.
///
/// Two roots are configurable: the state directory (HQ state, salt) and the
/// `WireGuard` directory (one `.conf` file per interface, grouped by kind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationLocationFinder {
    state_directory: PathBuf,
    wireguard_directory: PathBuf,
}

impl ConfigurationLocationFinder {
    /// Creates a finder rooted at the given directories.
    #[must_use]
    pub fn new(state_directory: impl Into<PathBuf>, wireguard_directory: impl Into<PathBuf>) -> Self {
        Self {
            state_directory: state_directory.into(),
            wireguard_directory: wireguard_directory.into(),
        }
    }

    /// Replaces the state directory.
    #[must_use]
    pub fn with_state_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.state_directory = directory.into();
        self
    }

    /// Replaces the `WireGuard` directory.
    #[must_use]
    pub fn with_wireguard_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.wireguard_directory = directory.into();
        self
    }

    /// Root of the wg-federation state.
    #[must_use]
    pub fn state_directory(&self) -> &Path {
        &self.state_directory
    }

    /// Root of the generated `WireGuard` configuration files.
    #[must_use]
    pub fn wireguard_directory(&self) -> &Path {
        &self.wireguard_directory
    }

    /// The HQ state document.
    #[must_use]
    pub fn state(&self) -> PathBuf {
        self.state_directory.join("state.json")
    }

    /// The salt record used for root passphrase key derivation.
    #[must_use]
    pub fn salt(&self) -> PathBuf {
        self.state_directory.join("salt.txt")
    }

    /// Directory of plain interface configuration files.
    #[must_use]
    pub fn interfaces_directory(&self) -> PathBuf {
        self.wireguard_directory.join("interfaces")
    }

    /// Directory of forum configuration files.
    #[must_use]
    pub fn forums_directory(&self) -> PathBuf {
        self.wireguard_directory.join("forums")
    }

    /// Directory of phone line configuration files.
    #[must_use]
    pub fn phone_lines_directory(&self) -> PathBuf {
        self.wireguard_directory.join("phone_lines")
    }
}

impl Default for ConfigurationLocationFinder {
    fn default() -> Self {
        let state_directory = dirs::data_dir().map_or_else(
            || PathBuf::from(FALLBACK_STATE_DIRECTORY),
            |data| data.join(APPLICATION_NAME),
        );
        Self::new(state_directory, DEFAULT_WIREGUARD_DIRECTORY)
    }
}
