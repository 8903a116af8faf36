//! Authenticated encryption keyed by the root passphrase.
//!
//! Messages are sealed with ChaCha20-Poly1305 under the key returned by
//! [`CryptographicKeyDeriver::derive_32b_key_from_root_passphrase`].
//! The output format is: `nonce || ciphertext || tag`.

use std::sync::Arc;

use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::deriver::{CryptographicKeyDeriver, DerivedKey};
use crate::error::{Error, Result};

/// Size of the nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under `key` with a random nonce.
///
/// # Errors
///
/// Returns an error if encryption fails.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|e| Error::Encryption {
        reason: format!("failed to create cipher: {e}"),
    })?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| Error::Encryption {
            reason: format!("encryption failed: {e}"),
        })?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypts a message produced by [`encrypt`].
///
/// # Errors
///
/// Returns an error if the message is too short, was sealed under another
/// key, or has been tampered with.
pub fn decrypt(key: &DerivedKey, message: &[u8]) -> Result<Vec<u8>> {
    if message.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Encryption {
            reason: format!(
                "message too short: expected at least {} bytes, got {}",
                NONCE_SIZE + TAG_SIZE,
                message.len()
            ),
        });
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|e| Error::Encryption {
        reason: format!("failed to create cipher: {e}"),
    })?;

    let (nonce, sealed) = message.split_at(NONCE_SIZE);
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|e| Error::Encryption {
            reason: format!("decryption failed: {e}"),
        })
}

/// Seals and opens messages with the current root passphrase key.
#[derive(Debug)]
pub struct MessageEncrypter {
    deriver: Arc<CryptographicKeyDeriver>,
}

impl MessageEncrypter {
    /// Creates an encrypter drawing keys from `deriver`.
    #[must_use]
    pub fn new(deriver: Arc<CryptographicKeyDeriver>) -> Self {
        Self { deriver }
    }

    /// Encrypts `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns an error if no key can be derived or encryption fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(&self.deriver.derive_32b_key_from_root_passphrase()?, plaintext)
    }

    /// Decrypts a message sealed by [`MessageEncrypter::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns an error if no key can be derived or authentication fails.
    pub fn decrypt(&self, message: &[u8]) -> Result<Vec<u8>> {
        decrypt(&self.deriver.derive_32b_key_from_root_passphrase()?, message)
    }

    /// Encrypts `plaintext` and encodes the result as standard base64.
    ///
    /// # Errors
    ///
    /// Returns an error if no key can be derived or encryption fails.
    pub fn encrypt_to_base64(&self, plaintext: &[u8]) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.encrypt(plaintext)?))
    }

    /// Decodes a base64 message and decrypts it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not base64 or cannot be decrypted.
    pub fn decrypt_from_base64(&self, message: &str) -> Result<Vec<u8>> {
        let sealed = base64::engine::general_purpose::STANDARD
            .decode(message.trim())
            .map_err(|e| Error::Encryption {
                reason: format!("invalid base64 message: {e}"),
            })?;
        self.decrypt(&sealed)
    }
}
