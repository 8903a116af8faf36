//! # wgf-wireguard
//!
//! `WireGuard` configuration value objects for wg-federation.
//!
//! Interfaces, peers and configurations validate every invariant when built
//! and are immutable afterwards. A configuration renders to `wg-quick`
//! `.ini` sections and hashes to the SHA-256 digest used to detect drift
//! against the file on disk.
//!
//! ## Example
//!
//! ```rust
//! use wgf_wireguard::{WireguardConfiguration, WireguardInterface, WireguardKeyGenerator};
//!
//! let generator = WireguardKeyGenerator::new();
//! let interface = WireguardInterface::builder()
//!     .key_pair(generator.generate_key_pair())
//!     .address("172.30.8.1/22".parse().expect("network"))
//!     .build()
//!     .expect("valid interface");
//!
//! let configuration = WireguardConfiguration::builder()
//!     .interface(interface)
//!     .name("wg0")
//!     .shared_psk(generator.generate_psk())
//!     .path("/etc/wireguard/interfaces/wg0.conf")
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(configuration.into_wireguard_ini()[0].title(), "Interface");
//! assert_eq!(configuration.into_sha256_digest().len(), 64);
//! ```

pub mod configuration;
pub mod error;
pub mod ini;
pub mod interface;
pub mod keys;
pub mod patch;
pub mod peer;
pub mod validation;

pub use configuration::{
    ConfigurationStatus, DEFAULT_INTERFACE_NAME, InterfaceKind, WireguardConfiguration,
    WireguardConfigurationBuilder,
};
pub use error::{Result, WireGuardError};
pub use ini::{IniSection, render_ini, write_ini};
pub use interface::{DEFAULT_LISTEN_PORT, WireguardInterface, WireguardInterfaceBuilder};
pub use keys::{KeyPair, WireguardKeyGenerator, public_key_from_private};
pub use patch::deep_merge;
pub use peer::{WireguardPeer, WireguardPeerBuilder};
