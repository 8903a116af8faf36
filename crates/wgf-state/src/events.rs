//! Event tags dispatched around state and configuration changes.

use std::fmt;

use wgf_wireguard::InterfaceKind;

/// Lifecycle tags of the HQ state and the configurations it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HqEvent {
    /// State read from disk.
    StateLoaded,
    /// State generated, not yet saved.
    StateBeforeCreate,
    /// State saved for the first time.
    StateCreated,
    /// State about to change.
    StateBeforeUpdate,
    /// State changed and saved.
    StateUpdated,
    /// Federation settings generated.
    FederationBeforeCreate,
    /// Configuration generated, not yet saved.
    ConfigurationBeforeCreate(InterfaceKind),
    /// Configuration saved for the first time.
    ConfigurationCreated(InterfaceKind),
    /// Configuration about to change.
    ConfigurationBeforeUpdate(InterfaceKind),
    /// Configuration changed and saved.
    ConfigurationUpdated(InterfaceKind),
}

impl HqEvent {
    /// Returns the kind carried by configuration events.
    #[must_use]
    pub const fn kind(self) -> Option<InterfaceKind> {
        match self {
            Self::ConfigurationBeforeCreate(kind)
            | Self::ConfigurationCreated(kind)
            | Self::ConfigurationBeforeUpdate(kind)
            | Self::ConfigurationUpdated(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for HqEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, tag) = match self {
            Self::StateLoaded => ("STATE", "LOADED"),
            Self::StateBeforeCreate => ("STATE", "BEFORE_CREATE"),
            Self::StateCreated => ("STATE", "CREATED"),
            Self::StateBeforeUpdate => ("STATE", "BEFORE_UPDATE"),
            Self::StateUpdated => ("STATE", "UPDATED"),
            Self::FederationBeforeCreate => ("FEDERATION", "BEFORE_CREATE"),
            Self::ConfigurationBeforeCreate(_) => ("", "CONFIGURATION_BEFORE_CREATE"),
            Self::ConfigurationCreated(_) => ("", "CONFIGURATION_CREATED"),
            Self::ConfigurationBeforeUpdate(_) => ("", "CONFIGURATION_BEFORE_UPDATE"),
            Self::ConfigurationUpdated(_) => ("", "CONFIGURATION_UPDATED"),
        };
        match self.kind() {
            Some(kind) => write!(f, "{}_{tag}", kind.as_str().to_uppercase()),
            None => write!(f, "{prefix}_{tag}"),
        }
    }
}

/// Tags dispatched around writes of a `WireGuard` `.ini` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireguardConfigurationEvent {
    /// A file is about to be written for the first time.
    ConfigurationFileBeforeCreate,
    /// A file was written for the first time.
    ConfigurationFileCreated,
    /// An existing file is about to be rewritten.
    ConfigurationFileBeforeUpdate,
    /// An existing file was rewritten.
    ConfigurationFileUpdated,
}
