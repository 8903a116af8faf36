//! The `[Interface]` half of a `WireGuard` configuration.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use wgf_secrets::SecretString;

use crate::error::{Result, WireGuardError};
use crate::ini::IniSection;
use crate::keys::KeyPair;
use crate::validation::{ensure_pairwise_distinct, validate_single_line, validate_wireguard_key};

/// Default UDP listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

/// Smallest MTU accepted for an interface.
pub const MIN_MTU: u16 = 576;

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A local `WireGuard` interface: keys, addresses and `wg-quick` hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireguardInterfaceBuilder")]
pub struct WireguardInterface {
    address: Vec<IpNet>,
    private_key: SecretString,
    public_key: String,
    listen_port: u16,
    dns: Vec<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<String>,
    pre_up: Vec<String>,
    post_up: Vec<String>,
    pre_down: Vec<String>,
    post_down: Vec<String>,
}

impl WireguardInterface {
    /// Starts building an interface.
    #[must_use]
    pub fn builder() -> WireguardInterfaceBuilder {
        WireguardInterfaceBuilder::default()
    }

    /// Addresses assigned to the interface.
    #[must_use]
    pub fn address(&self) -> &[IpNet] {
        &self.address
    }

    /// Private key.
    #[must_use]
    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    /// Public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// UDP listen port.
    #[must_use]
    pub const fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// DNS servers pushed by `wg-quick`.
    #[must_use]
    pub fn dns(&self) -> &[IpAddr] {
        &self.dns
    }

    /// Interface MTU.
    #[must_use]
    pub const fn mtu(&self) -> Option<u16> {
        self.mtu
    }

    /// Routing table.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Renders the `[Interface]` section.
    ///
    /// Empty lists and unset options produce no entry.
    #[must_use]
    pub fn ini_section(&self) -> IniSection {
        let mut section = IniSection::new("Interface");
        section.push("PrivateKey", self.private_key.expose());
        if !self.address.is_empty() {
            section.push("Address", join(&self.address));
        }
        section.push("ListenPort", self.listen_port.to_string());
        if !self.dns.is_empty() {
            section.push("DNS", join(&self.dns));
        }
        section.push_opt("MTU", self.mtu.map(|mtu| mtu.to_string()));
        section.push_opt("Table", self.table.clone());
        for (key, hooks) in [
            ("PreUp", &self.pre_up),
            ("PostUp", &self.post_up),
            ("PreDown", &self.pre_down),
            ("PostDown", &self.post_down),
        ] {
            for hook in hooks {
                section.push(key, hook.clone());
            }
        }
        section
    }
}

/// Builder and wire shape of [`WireguardInterface`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireguardInterfaceBuilder {
    address: Vec<IpNet>,
    private_key: Option<SecretString>,
    public_key: Option<String>,
    listen_port: Option<u16>,
    dns: Vec<IpAddr>,
    mtu: Option<u16>,
    table: Option<String>,
    pre_up: Vec<String>,
    post_up: Vec<String>,
    pre_down: Vec<String>,
    post_down: Vec<String>,
}

impl WireguardInterfaceBuilder {
    /// Adds an address.
    #[must_use]
    pub fn address(mut self, address: IpNet) -> Self {
        self.address.push(address);
        self
    }

    /// Sets both keys from a pair.
    #[must_use]
    pub fn key_pair(self, pair: KeyPair) -> Self {
        let (private, public) = pair.into_parts();
        self.private_key(private).public_key(public)
    }

    /// Sets the private key.
    #[must_use]
    pub fn private_key(mut self, key: SecretString) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Sets the public key.
    #[must_use]
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Adds a DNS server.
    #[must_use]
    pub fn dns(mut self, server: IpAddr) -> Self {
        self.dns.push(server);
        self
    }

    /// Sets the MTU.
    #[must_use]
    pub const fn mtu(mut self, mtu: u16) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Sets the routing table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a `PostUp` hook.
    #[must_use]
    pub fn post_up(mut self, command: impl Into<String>) -> Self {
        self.post_up.push(command.into());
        self
    }

    /// Adds a `PostDown` hook.
    #[must_use]
    pub fn post_down(mut self, command: impl Into<String>) -> Self {
        self.post_down.push(command.into());
        self
    }

    /// Validates and builds the interface.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] when a key is missing or
    /// malformed, both keys are equal, the MTU is below [`MIN_MTU`], the
    /// table is blank, or the table or a hook contains a line break.
    pub fn build(self) -> Result<WireguardInterface> {
        let private_key = self
            .private_key
            .ok_or_else(|| WireGuardError::validation("interface.private_key", "is required"))?;
        let public_key = self
            .public_key
            .ok_or_else(|| WireGuardError::validation("interface.public_key", "is required"))?;
        validate_wireguard_key("interface.private_key", private_key.expose())?;
        validate_wireguard_key("interface.public_key", &public_key)?;
        ensure_pairwise_distinct(&[
            ("interface.private_key", private_key.expose()),
            ("interface.public_key", &public_key),
        ])?;

        if let Some(mtu) = self.mtu.filter(|mtu| *mtu < MIN_MTU) {
            return Err(WireGuardError::validation(
                "interface.mtu",
                format!("{mtu} is below {MIN_MTU}"),
            ));
        }
        if let Some(table) = self.table.as_deref() {
            if table.trim().is_empty() {
                return Err(WireGuardError::validation("interface.table", "must not be blank"));
            }
            validate_single_line("interface.table", table)?;
        }
        let hooks = [&self.pre_up, &self.post_up, &self.pre_down, &self.post_down];
        for command in hooks.iter().flat_map(|h| h.iter()) {
            validate_single_line("interface.hooks", command)?;
        }

        Ok(WireguardInterface {
            address: self.address,
            private_key,
            public_key,
            listen_port: self.listen_port.unwrap_or(DEFAULT_LISTEN_PORT),
            dns: self.dns,
            mtu: self.mtu,
            table: self.table,
            pre_up: self.pre_up,
            post_up: self.post_up,
            pre_down: self.pre_down,
            post_down: self.post_down,
        })
    }
}

impl From<WireguardInterface> for WireguardInterfaceBuilder {
    fn from(interface: WireguardInterface) -> Self {
        Self {
            address: interface.address,
            private_key: Some(interface.private_key),
            public_key: Some(interface.public_key),
            listen_port: Some(interface.listen_port),
            dns: interface.dns,
            mtu: interface.mtu,
            table: interface.table,
            pre_up: interface.pre_up,
            post_up: interface.post_up,
            pre_down: interface.pre_down,
            post_down: interface.post_down,
        }
    }
}

impl TryFrom<WireguardInterfaceBuilder> for WireguardInterface {
    type Error = WireGuardError;

    fn try_from(builder: WireguardInterfaceBuilder) -> Result<Self> {
        builder.build()
    }
}
