//! Root passphrase key derivation.
//!
//! The root passphrase and a persisted random salt go through
//! PBKDF2-HMAC-SHA-512 to produce a 32-byte symmetric key. Derived keys are
//! cached per passphrase, so repeated derivations cost a cache lookup.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::Value;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::{debug, info};
use wgf_store::{
    CanLoadConfiguration, CanSaveConfiguration, ConfigurationData, ConfigurationLocationFinder,
    ConfigurationLocker, RAW_FIELD,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cache::{CacheStatus, DerivedKeyCache, Fingerprint};
use crate::error::{Error, Result};
use crate::input::RootPassphraseSource;
use crate::secret::SecretString;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 1111;

/// Size of a derived key in bytes.
pub const DERIVED_KEY_SIZE: usize = 32;

/// Number of random bytes in a freshly created salt.
pub const SALT_SIZE: usize = 32;

/// Context string separating passphrase fingerprints from any other BLAKE3 use.
const FINGERPRINT_CONTEXT: &str = "wg-federation 2024 root passphrase cache fingerprint";

/// A 32-byte key derived from the root passphrase. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; DERIVED_KEY_SIZE],
}

impl DerivedKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes_array(bytes: [u8; DERIVED_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for DerivedKey {}

/// Runs PBKDF2-HMAC-SHA-512 over `passphrase` and `salt`.
#[must_use]
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> DerivedKey {
    DerivedKey::from_bytes_array(pbkdf2::pbkdf2_hmac_array::<Sha512, DERIVED_KEY_SIZE>(
        passphrase,
        salt,
        PBKDF2_ITERATIONS,
    ))
}

fn fingerprint(passphrase: &SecretString) -> Fingerprint {
    blake3::derive_key(FINGERPRINT_CONTEXT, passphrase.expose().as_bytes())
}

/// Derives symmetric keys from the operator's root passphrase.
pub struct CryptographicKeyDeriver {
    passphrase_source: Arc<dyn RootPassphraseSource>,
    locations: ConfigurationLocationFinder,
    loader: Arc<dyn CanLoadConfiguration>,
    saver: Arc<dyn CanSaveConfiguration>,
    locker: ConfigurationLocker,
    cache: DerivedKeyCache,
}

impl CryptographicKeyDeriver {
    /// Creates a deriver reading the passphrase from `passphrase_source` and
    /// the salt from `locations.salt()`.
    #[must_use]
    pub fn new(
        passphrase_source: Arc<dyn RootPassphraseSource>,
        locations: ConfigurationLocationFinder,
        loader: Arc<dyn CanLoadConfiguration>,
        saver: Arc<dyn CanSaveConfiguration>,
    ) -> Self {
        Self {
            passphrase_source,
            locations,
            loader,
            saver,
            locker: ConfigurationLocker::default(),
            cache: DerivedKeyCache::default(),
        }
    }

    /// Replaces the locker guarding the salt file.
    #[must_use]
    pub fn with_locker(mut self, locker: ConfigurationLocker) -> Self {
        self.locker = locker;
        self
    }

    /// Replaces the derived key cache.
    #[must_use]
    pub fn with_cache(mut self, cache: DerivedKeyCache) -> Self {
        self.cache = cache;
        self
    }

    /// Derives the 32-byte key for the current root passphrase and salt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootPassphraseNotSet`] if no non-empty passphrase is
    /// available, or a loader error if the salt cannot be read.
    pub fn derive_32b_key_from_root_passphrase(&self) -> Result<DerivedKey> {
        let passphrase = self
            .passphrase_source
            .root_passphrase()
            .filter(|passphrase| !passphrase.is_empty())
            .ok_or(Error::RootPassphraseNotSet)?;

        self.cache
            .get_or_try_insert_with(fingerprint(&passphrase), || {
                let salt = self.load_salt()?;
                debug!(iterations = PBKDF2_ITERATIONS, "deriving key from root passphrase");
                Ok(derive_key(passphrase.expose().as_bytes(), salt.as_bytes()))
            })
    }

    /// Forgets every derived key; the next derivation recomputes.
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("cleared derived key cache");
    }

    /// Reports derived key cache diagnostics.
    #[must_use]
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Generates a new random salt and persists it, replacing any existing one.
    ///
    /// Every key derived from the previous salt becomes unreachable, so the
    /// cache is cleared as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt cannot be saved, or if the salt lock
    /// cannot be taken within the locker's timeout.
    pub fn create_salt(&self) -> Result<()> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let mut record = ConfigurationData::new();
        record.insert(
            RAW_FIELD.to_string(),
            Value::String(base64::engine::general_purpose::STANDARD.encode(salt)),
        );
        salt.zeroize();

        let location = self.locations.salt();
        {
            let _lock = self.locker.lock_exclusively(&location)?;
            self.saver.save(&record, &location)?;
        }
        self.clear_cache();

        info!(path = %location.display(), "created new salt");
        Ok(())
    }

    fn load_salt(&self) -> Result<String> {
        let location = self.locations.salt();
        let mut record = {
            let _lock = self.locker.lock_shared(&location)?;
            self.loader.load(&location)?
        };

        match record.remove(RAW_FIELD) {
            Some(Value::String(raw)) if !raw.is_empty() => Ok(raw),
            Some(Value::String(_)) => Err(Error::InvalidSalt {
                reason: format!("{} is empty", location.display()),
            }),
            _ => Err(Error::InvalidSalt {
                reason: format!("{} has no `{RAW_FIELD}` field", location.display()),
            }),
        }
    }
}

impl fmt::Debug for CryptographicKeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptographicKeyDeriver")
            .field("salt", &self.locations.salt())
            .field("cache", &self.cache.status())
            .finish_non_exhaustive()
    }
}
