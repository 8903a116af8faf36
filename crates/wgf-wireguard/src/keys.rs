//! `WireGuard` key generation.
//!
//! `WireGuard` uses Curve25519 for key exchange. Keys are 32 bytes, exchanged
//! as standard base64 text.

use std::fmt;

use base64::Engine;
use rand_core::{OsRng, RngCore};
use wgf_secrets::SecretString;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{Result, WireGuardError};

/// `WireGuard` key size in bytes (256-bit Curve25519 keys).
pub const KEY_SIZE: usize = 32;

fn decode_key(encoded: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| WireGuardError::InvalidBase64(e.to_string()))?;
    <[u8; KEY_SIZE]>::try_from(bytes.as_slice())
        .map_err(|_| WireGuardError::InvalidKeyLength(bytes.len()))
}

fn encode_key(bytes: &[u8; KEY_SIZE]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Derives the base64 public key of a base64 private key.
///
/// # Errors
///
/// Returns an error if `private_key` is not a base64 32-byte key.
pub fn public_key_from_private(private_key: &SecretString) -> Result<String> {
    let mut bytes = decode_key(private_key.expose())?;
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();
    Ok(encode_key(X25519PublicKey::from(&secret).as_bytes()))
}

/// A `WireGuard` key pair as base64 text.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: SecretString,
    public_key: String,
}

impl KeyPair {
    /// Generates a new random key pair.
    #[must_use]
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self {
            private_key: SecretString::new(encode_key(&secret.to_bytes())),
            public_key: encode_key(public.as_bytes()),
        }
    }

    /// Rebuilds a key pair from an existing private key.
    ///
    /// # Errors
    ///
    /// Returns an error if `private_key` is not a base64 32-byte key.
    pub fn from_private_key(private_key: SecretString) -> Result<Self> {
        let public_key = public_key_from_private(&private_key)?;
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Returns the private key.
    #[must_use]
    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    /// Returns the public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Splits the pair into `(private, public)`.
    #[must_use]
    pub fn into_parts(self) -> (SecretString, String) {
        (self.private_key, self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Produces fresh key material for interfaces and peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct WireguardKeyGenerator;

impl WireguardKeyGenerator {
    /// Creates a generator backed by the OS random source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates a Curve25519 key pair.
    #[must_use]
    pub fn generate_key_pair(&self) -> KeyPair {
        KeyPair::generate()
    }

    /// Generates a random 32-byte pre-shared key.
    #[must_use]
    pub fn generate_psk(&self) -> SecretString {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        let psk = SecretString::new(encode_key(&bytes));
        bytes.zeroize();
        psk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::is_wireguard_key;

    #[test]
    fn generated_keys_have_wireguard_shape() {
        let generator = WireguardKeyGenerator::new();
        let pair = generator.generate_key_pair();

        assert!(is_wireguard_key(pair.private_key().expose()));
        assert!(is_wireguard_key(pair.public_key()));
        assert!(is_wireguard_key(generator.generate_psk().expose()));
    }

    #[test]
    fn generated_pairs_differ() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.private_key(), b.private_key());
    }

    #[test]
    fn public_key_derivation_matches_generation() {
        let pair = KeyPair::generate();
        let rebuilt = KeyPair::from_private_key(pair.private_key().clone()).expect("rebuild");
        assert_eq!(rebuilt, pair);
    }

    #[test]
    fn known_public_key() {
        // RFC 7748 section 6.1, Alice.
        let private = SecretString::new("dwdtCnMYpX08FsFyUbJmRd9ML4frwJkqsXf7pR25LCo=");
        let public = public_key_from_private(&private).expect("derive");
        assert_eq!(public, "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=");
    }

    #[test]
    fn rejects_malformed_private_key() {
        assert!(matches!(
            public_key_from_private(&SecretString::new("!!!")),
            Err(WireGuardError::InvalidBase64(_))
        ));
        assert_eq!(
            public_key_from_private(&SecretString::new("AAAA")),
            Err(WireGuardError::InvalidKeyLength(3))
        );
    }

    proptest::proptest! {
        #[test]
        fn every_32_byte_key_has_wireguard_shape(bytes in proptest::array::uniform32(proptest::num::u8::ANY)) {
            proptest::prop_assert!(is_wireguard_key(&encode_key(&bytes)));
        }
    }

    #[test]
    fn debug_redacts_private_key() {
        let pair = KeyPair::generate();
        let debug = format!("{pair:?}");
        assert!(!debug.contains(pair.private_key().expose()));
        assert!(debug.contains(pair.public_key()));
    }
}
