//! A complete `WireGuard` configuration: one interface, its peers and the
//! bookkeeping needed to reconcile it against the file on disk.
//!
//! Values are immutable. Every change goes through [`WireguardConfiguration::with_changes`]
//! or [`WireguardConfiguration::with_last_loaded`], which validate again and
//! return a new value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use wgf_secrets::SecretString;

use crate::error::{Result, WireGuardError};
use crate::ini::{IniSection, render_ini};
use crate::interface::{WireguardInterface, WireguardInterfaceBuilder};
use crate::patch::deep_merge;
use crate::peer::{WireguardPeer, WireguardPeerBuilder};
use crate::validation::{
    ensure_pairwise_distinct, validate_interface_name, validate_sha256_digest,
    validate_wireguard_key,
};

/// Interface name used when none is given.
pub const DEFAULT_INTERFACE_NAME: &str = "wg-federation0";

/// Lifecycle status of a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationStatus {
    /// Never written to disk.
    #[default]
    New,
    /// Written at least once.
    Active,
}

/// Category of a federation interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterfaceKind {
    /// The member-facing interface.
    #[default]
    #[serde(rename = "interfaces")]
    Interface,
    /// Forum interface shared by all members.
    #[serde(rename = "forums")]
    Forum,
    /// Phone line interface used for HQ signalling.
    #[serde(rename = "phone_lines")]
    PhoneLine,
}

impl InterfaceKind {
    /// Every kind, in state order.
    pub const ALL: [Self; 3] = [Self::Interface, Self::Forum, Self::PhoneLine];

    /// Key of this kind in state documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interfaces",
            Self::Forum => "forums",
            Self::PhoneLine => "phone_lines",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InterfaceKind {
    type Err = WireGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                WireGuardError::validation(
                    "kind",
                    format!("'{s}' is not one of interfaces, forums, phone_lines"),
                )
            })
    }
}

/// A validated `WireGuard` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireguardConfigurationBuilder")]
pub struct WireguardConfiguration {
    interface: WireguardInterface,
    peers: Vec<WireguardPeer>,
    name: String,
    status: ConfigurationStatus,
    kind: InterfaceKind,
    shared_psk: SecretString,
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_loaded_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_loaded_date: Option<DateTime<Utc>>,
}

fn serde_error(error: &serde_json::Error) -> WireGuardError {
    WireGuardError::validation("configuration", error.to_string())
}

impl WireguardConfiguration {
    /// Starts building a configuration.
    #[must_use]
    pub fn builder() -> WireguardConfigurationBuilder {
        WireguardConfigurationBuilder::default()
    }

    /// Builds and validates a configuration from its document form.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] for malformed documents and
    /// any invariant violation.
    pub fn from_dict(configuration: &Value) -> Result<Self> {
        WireguardConfigurationBuilder::deserialize(configuration)
            .map_err(|e| serde_error(&e))?
            .build()
    }

    /// Builds one configuration per entry of a `name -> document` mapping.
    ///
    /// Each entry succeeds or fails on its own. `null` is an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] when `configurations` is
    /// neither an object nor `null`.
    pub fn from_dict_of_dicts(configurations: &Value) -> Result<BTreeMap<String, Result<Self>>> {
        match configurations {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(entries) => Ok(entries
                .iter()
                .map(|(name, configuration)| {
                    let built = Self::from_dict(configuration).map_err(|e| match e {
                        WireGuardError::DataValidation { field, reason } => {
                            WireGuardError::validation(format!("{name}.{field}"), reason)
                        }
                        other => other,
                    });
                    (name.clone(), built)
                })
                .collect()),
            _ => Err(WireGuardError::validation(
                "configurations",
                "expected a mapping of name to configuration",
            )),
        }
    }

    /// Like [`Self::from_dict_of_dicts`], failing on the first invalid entry.
    ///
    /// # Errors
    ///
    /// Returns the first entry's error, its field prefixed with the entry name.
    pub fn try_from_dict_of_dicts(configurations: &Value) -> Result<BTreeMap<String, Self>> {
        Self::from_dict_of_dicts(configurations)?
            .into_iter()
            .map(|(name, built)| built.map(|configuration| (name, configuration)))
            .collect()
    }

    /// Document form, accepted back by [`Self::from_dict`].
    ///
    /// # Errors
    ///
    /// Fails only if the path is not valid UTF-8.
    pub fn to_dict(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| serde_error(&e))
    }

    /// Deep-merges `changes` into this configuration and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] if the merged document is
    /// invalid. `self` is left untouched.
    pub fn with_changes(&self, changes: Value) -> Result<Self> {
        let mut document = self.to_dict()?;
        deep_merge(&mut document, changes);
        Self::from_dict(&document)
    }

    /// Records the digest of what is now on disk.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] if `hash` is not a hex SHA-256 digest.
    pub fn with_last_loaded(&self, hash: impl Into<String>, date: DateTime<Utc>) -> Result<Self> {
        let hash = hash.into();
        validate_sha256_digest("last_loaded_hash", &hash)?;
        Ok(Self {
            last_loaded_hash: Some(hash),
            last_loaded_date: Some(date),
            ..self.clone()
        })
    }

    /// Returns a copy with another status.
    #[must_use]
    pub fn with_status(&self, status: ConfigurationStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// `[Interface]` first, then one `[Peer]` per peer in stored order.
    #[must_use]
    pub fn into_wireguard_ini(&self) -> Vec<IniSection> {
        std::iter::once(self.interface.ini_section())
            .chain(self.peers.iter().map(|peer| peer.ini_section(&self.shared_psk)))
            .collect()
    }

    /// SHA-256 of the rendered `.ini` text followed by the interface public
    /// key, as 64 lowercase hex characters.
    #[must_use]
    pub fn into_sha256_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(render_ini(&self.into_wireguard_ini()).as_bytes());
        hasher.update(self.interface.public_key().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The interface.
    #[must_use]
    pub const fn interface(&self) -> &WireguardInterface {
        &self.interface
    }

    /// Peers in stored order.
    #[must_use]
    pub fn peers(&self) -> &[WireguardPeer] {
        &self.peers
    }

    /// Interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ConfigurationStatus {
        self.status
    }

    /// Interface category.
    #[must_use]
    pub const fn kind(&self) -> InterfaceKind {
        self.kind
    }

    /// PSK shared by peers without their own.
    #[must_use]
    pub fn shared_psk(&self) -> &SecretString {
        &self.shared_psk
    }

    /// Location of the `.ini` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digest recorded at the last load.
    #[must_use]
    pub fn last_loaded_hash(&self) -> Option<&str> {
        self.last_loaded_hash.as_deref()
    }

    /// Time of the last load.
    #[must_use]
    pub const fn last_loaded_date(&self) -> Option<DateTime<Utc>> {
        self.last_loaded_date
    }
}

/// Builder and wire shape of [`WireguardConfiguration`].
///
/// Nested interface and peers are kept as builders so that deserialization
/// reports structured validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireguardConfigurationBuilder {
    interface: Option<WireguardInterfaceBuilder>,
    peers: Vec<WireguardPeerBuilder>,
    name: Option<String>,
    status: ConfigurationStatus,
    kind: InterfaceKind,
    shared_psk: Option<SecretString>,
    path: Option<PathBuf>,
    last_loaded_hash: Option<String>,
    last_loaded_date: Option<DateTime<Utc>>,
}

impl WireguardConfigurationBuilder {
    /// Sets the interface.
    #[must_use]
    pub fn interface(mut self, interface: WireguardInterface) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Appends a peer.
    #[must_use]
    pub fn peer(mut self, peer: WireguardPeer) -> Self {
        self.peers.push(peer.into());
        self
    }

    /// Sets the interface name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn status(mut self, status: ConfigurationStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the kind.
    #[must_use]
    pub const fn kind(mut self, kind: InterfaceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the shared PSK.
    #[must_use]
    pub fn shared_psk(mut self, psk: SecretString) -> Self {
        self.shared_psk = Some(psk);
        self
    }

    /// Sets the `.ini` location.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Validates every invariant and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] when the interface, shared
    /// PSK or path is missing, any key or the name is malformed, the shared
    /// PSK and interface keys are not pairwise distinct, or the last loaded
    /// hash is not a digest.
    pub fn build(self) -> Result<WireguardConfiguration> {
        let interface = self
            .interface
            .ok_or_else(|| WireGuardError::validation("interface", "is required"))?
            .build()?;
        let peers = self
            .peers
            .into_iter()
            .map(WireguardPeerBuilder::build)
            .collect::<Result<Vec<_>>>()?;

        let name = self
            .name
            .unwrap_or_else(|| DEFAULT_INTERFACE_NAME.to_string());
        validate_interface_name(&name)?;

        let shared_psk = self
            .shared_psk
            .ok_or_else(|| WireGuardError::validation("shared_psk", "is required"))?;
        validate_wireguard_key("shared_psk", shared_psk.expose())?;
        ensure_pairwise_distinct(&[
            ("shared_psk", shared_psk.expose()),
            ("interface.public_key", interface.public_key()),
            ("interface.private_key", interface.private_key().expose()),
        ])?;

        let path = self
            .path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| WireGuardError::validation("path", "is required"))?;

        if let Some(hash) = &self.last_loaded_hash {
            validate_sha256_digest("last_loaded_hash", hash)?;
        }

        Ok(WireguardConfiguration {
            interface,
            peers,
            name,
            status: self.status,
            kind: self.kind,
            shared_psk,
            path,
            last_loaded_hash: self.last_loaded_hash,
            last_loaded_date: self.last_loaded_date,
        })
    }
}

impl TryFrom<WireguardConfigurationBuilder> for WireguardConfiguration {
    type Error = WireGuardError;

    fn try_from(builder: WireguardConfigurationBuilder) -> Result<Self> {
        builder.build()
    }
}
