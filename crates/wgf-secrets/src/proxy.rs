//! Loader and saver proxies that keep documents encrypted at rest.
//!
//! An encrypted document is stored as `{"encrypted": "<base64>"}` where the
//! payload is the sealed JSON serialization of the original document.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use wgf_store::{CanLoadConfiguration, CanSaveConfiguration, ConfigurationData};

use crate::encryption::MessageEncrypter;

/// Field holding the sealed payload of an encrypted document.
pub const ENCRYPTED_FIELD: &str = "encrypted";

fn store_error(path: &Path, reason: impl std::fmt::Display) -> wgf_store::Error {
    wgf_store::Error::Parse {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Encrypts documents before handing them to the wrapped saver.
pub struct EncryptConfigurationSaver {
    saver: Arc<dyn CanSaveConfiguration>,
    encrypter: Arc<MessageEncrypter>,
}

impl EncryptConfigurationSaver {
    /// Wraps `saver`, sealing every document with `encrypter`.
    #[must_use]
    pub fn new(saver: Arc<dyn CanSaveConfiguration>, encrypter: Arc<MessageEncrypter>) -> Self {
        Self { saver, encrypter }
    }
}

impl CanSaveConfiguration for EncryptConfigurationSaver {
    fn supports(&self, destination: &Path) -> bool {
        self.saver.supports(destination)
    }

    fn save(&self, data: &ConfigurationData, destination: &Path) -> wgf_store::Result<()> {
        let plaintext = serde_json::to_vec(data).map_err(|e| wgf_store::Error::Serialize {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })?;
        let sealed = self
            .encrypter
            .encrypt_to_base64(&plaintext)
            .map_err(|e| wgf_store::Error::codec(destination, e))?;

        let mut envelope = ConfigurationData::new();
        envelope.insert(ENCRYPTED_FIELD.to_string(), Value::String(sealed));
        debug!(path = %destination.display(), "saving encrypted configuration");
        self.saver.save(&envelope, destination)
    }
}

/// Decrypts documents produced by [`EncryptConfigurationSaver`].
///
/// Documents without an `encrypted` envelope pass through unchanged.
pub struct DecryptConfigurationLoader {
    loader: Arc<dyn CanLoadConfiguration>,
    encrypter: Arc<MessageEncrypter>,
}

impl DecryptConfigurationLoader {
    /// Wraps `loader`, opening sealed documents with `encrypter`.
    #[must_use]
    pub fn new(loader: Arc<dyn CanLoadConfiguration>, encrypter: Arc<MessageEncrypter>) -> Self {
        Self { loader, encrypter }
    }
}

impl CanLoadConfiguration for DecryptConfigurationLoader {
    fn supports(&self, source: &Path) -> bool {
        self.loader.supports(source)
    }

    fn load(&self, source: &Path) -> wgf_store::Result<ConfigurationData> {
        let data = self.loader.load(source)?;
        let sealed = match data.get(ENCRYPTED_FIELD) {
            Some(Value::String(sealed)) if data.len() == 1 => sealed,
            _ => return Ok(data),
        };

        let plaintext = self
            .encrypter
            .decrypt_from_base64(sealed)
            .map_err(|e| wgf_store::Error::codec(source, e))?;
        debug!(path = %source.display(), "decrypted configuration");

        match serde_json::from_slice::<Value>(&plaintext) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(store_error(source, "decrypted payload is not a JSON object")),
            Err(e) => Err(store_error(source, e)),
        }
    }
}
