//! # wgf-secrets
//!
//! Secret handling for wg-federation:
//!
//! - **Redacted secrets**: [`SecretString`] never prints its value and is zeroized on drop
//! - **Key derivation**: [`CryptographicKeyDeriver`] turns the root passphrase and a
//!   persisted salt into a 32-byte key with PBKDF2-HMAC-SHA-512, cached per passphrase
//! - **Encryption at rest**: [`MessageEncrypter`] and the loader/saver proxies seal
//!   documents with ChaCha20-Poly1305 under the derived key
//!
//! ## Example
//!
//! ```rust
//! use wgf_secrets::SecretString;
//!
//! let passphrase = SecretString::new("correct horse battery staple");
//! assert_eq!(format!("{passphrase}"), "[REDACTED]");
//! ```

pub mod cache;
pub mod deriver;
pub mod encryption;
pub mod error;
pub mod input;
pub mod proxy;
pub mod secret;

pub use cache::{CacheStatus, DerivedKeyCache};
pub use deriver::{CryptographicKeyDeriver, DerivedKey};
pub use encryption::MessageEncrypter;
pub use error::{Error, Result};
pub use input::{RootPassphraseSource, UserInput};
pub use proxy::{DecryptConfigurationLoader, EncryptConfigurationSaver};
pub use secret::SecretString;
