//! `[Peer]` entries.

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use wgf_secrets::SecretString;

use crate::error::{Result, WireGuardError};
use crate::ini::IniSection;
use crate::validation::validate_wireguard_key;

/// A remote peer of a `WireGuard` interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireguardPeerBuilder")]
pub struct WireguardPeer {
    public_key: String,
    allowed_ips: Vec<IpNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistent_keepalive: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preshared_key: Option<SecretString>,
}

impl WireguardPeer {
    /// Starts building a peer.
    #[must_use]
    pub fn builder() -> WireguardPeerBuilder {
        WireguardPeerBuilder::default()
    }

    /// Public key of the peer.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Networks routed to the peer.
    #[must_use]
    pub fn allowed_ips(&self) -> &[IpNet] {
        &self.allowed_ips
    }

    /// `host:port` the peer is reached at.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Keepalive interval in seconds.
    #[must_use]
    pub const fn persistent_keepalive(&self) -> Option<u16> {
        self.persistent_keepalive
    }

    /// Peer-specific pre-shared key, overriding the configuration one.
    #[must_use]
    pub fn preshared_key(&self) -> Option<&SecretString> {
        self.preshared_key.as_ref()
    }

    /// Renders the `[Peer]` section, falling back to `shared_psk`.
    #[must_use]
    pub fn ini_section(&self, shared_psk: &SecretString) -> IniSection {
        let mut section = IniSection::new("Peer");
        section.push("PublicKey", self.public_key.clone());
        if !self.allowed_ips.is_empty() {
            section.push(
                "AllowedIPs",
                self.allowed_ips
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        section.push_opt("Endpoint", self.endpoint.clone());
        section.push_opt(
            "PersistentKeepalive",
            self.persistent_keepalive.map(|k| k.to_string()),
        );
        let psk = self.preshared_key.as_ref().unwrap_or(shared_psk);
        section.push("PresharedKey", psk.expose());
        section
    }
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let invalid = |reason: &str| WireGuardError::validation("peer.endpoint", reason);
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(invalid("host must be non-empty without whitespace"));
    }
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid("port must be between 1 and 65535")),
        Ok(_) => Ok(()),
    }
}

/// Builder and wire shape of [`WireguardPeer`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireguardPeerBuilder {
    public_key: Option<String>,
    allowed_ips: Vec<IpNet>,
    endpoint: Option<String>,
    persistent_keepalive: Option<u16>,
    preshared_key: Option<SecretString>,
}

impl WireguardPeerBuilder {
    /// Sets the public key.
    #[must_use]
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Adds an allowed network.
    #[must_use]
    pub fn allowed_ip(mut self, net: IpNet) -> Self {
        self.allowed_ips.push(net);
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the keepalive interval.
    #[must_use]
    pub const fn persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = Some(seconds);
        self
    }

    /// Sets a peer-specific pre-shared key.
    #[must_use]
    pub fn preshared_key(mut self, key: SecretString) -> Self {
        self.preshared_key = Some(key);
        self
    }

    /// Validates and builds the peer.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] for a missing or malformed
    /// key or an endpoint that is not `host:port`.
    pub fn build(self) -> Result<WireguardPeer> {
        let public_key = self
            .public_key
            .ok_or_else(|| WireGuardError::validation("peer.public_key", "is required"))?;
        validate_wireguard_key("peer.public_key", &public_key)?;
        if let Some(psk) = &self.preshared_key {
            validate_wireguard_key("peer.preshared_key", psk.expose())?;
        }
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint(endpoint)?;
        }
        Ok(WireguardPeer {
            public_key,
            allowed_ips: self.allowed_ips,
            endpoint: self.endpoint,
            persistent_keepalive: self.persistent_keepalive,
            preshared_key: self.preshared_key,
        })
    }
}

impl From<WireguardPeer> for WireguardPeerBuilder {
    fn from(peer: WireguardPeer) -> Self {
        Self {
            public_key: Some(peer.public_key),
            allowed_ips: peer.allowed_ips,
            endpoint: peer.endpoint,
            persistent_keepalive: peer.persistent_keepalive,
            preshared_key: peer.preshared_key,
        }
    }
}

impl TryFrom<WireguardPeerBuilder> for WireguardPeer {
    type Error = WireGuardError;

    fn try_from(builder: WireguardPeerBuilder) -> Result<Self> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PUBLIC: &str = "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=";
    const PSK: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";
    const OTHER_PSK: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test_case("vpn.example.com:51820", true ; "hostname")]
    #[test_case("203.0.113.7:10100", true ; "ipv4")]
    #[test_case("[2001:db8::1]:51820", true ; "bracketed ipv6")]
    #[test_case("vpn.example.com", false ; "missing port")]
    #[test_case(":51820", false ; "missing host")]
    #[test_case("host:0", false ; "port zero")]
    #[test_case("host:70000", false ; "port overflow")]
    fn endpoint_shape(endpoint: &str, valid: bool) {
        let built = WireguardPeer::builder()
            .public_key(PUBLIC)
            .endpoint(endpoint)
            .build();
        assert_eq!(built.is_ok(), valid);
    }

    #[test]
    fn peer_psk_overrides_shared_psk() {
        let shared = SecretString::new(OTHER_PSK);
        let plain = WireguardPeer::builder().public_key(PUBLIC).build().expect("peer");
        assert_eq!(plain.ini_section(&shared).get("PresharedKey"), Some(OTHER_PSK));

        let own = WireguardPeer::builder()
            .public_key(PUBLIC)
            .preshared_key(SecretString::new(PSK))
            .build()
            .expect("peer");
        assert_eq!(own.ini_section(&shared).get("PresharedKey"), Some(PSK));
    }

    #[test]
    fn renders_optional_entries_only_when_set() {
        let peer = WireguardPeer::builder()
            .public_key(PUBLIC)
            .allowed_ip("172.32.0.0/22".parse().expect("net"))
            .persistent_keepalive(25)
            .build()
            .expect("peer");
        let section = peer.ini_section(&SecretString::new(PSK));
        assert_eq!(section.get("AllowedIPs"), Some("172.32.0.0/22"));
        assert_eq!(section.get("PersistentKeepalive"), Some("25"));
        assert_eq!(section.get("Endpoint"), None);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(WireguardPeer::builder().build().is_err());
        assert!(WireguardPeer::builder().public_key("nope").build().is_err());
        assert!(
            WireguardPeer::builder()
                .public_key(PUBLIC)
                .preshared_key(SecretString::new("nope"))
                .build()
                .is_err()
        );
    }
}
