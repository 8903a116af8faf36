//! User-provided secret input.

use parking_lot::RwLock;

use crate::secret::SecretString;

/// Supplies the current root passphrase.
pub trait RootPassphraseSource: Send + Sync {
    /// Returns the root passphrase, if one has been provided.
    fn root_passphrase(&self) -> Option<SecretString>;
}

/// Secrets the operator handed to this process.
///
/// The root passphrase can be rotated at runtime; readers always observe the
/// latest value.
#[derive(Debug, Default)]
pub struct UserInput {
    root_passphrase: RwLock<Option<SecretString>>,
}

impl UserInput {
    /// Creates input holding the given root passphrase.
    #[must_use]
    pub fn new(root_passphrase: Option<SecretString>) -> Self {
        Self {
            root_passphrase: RwLock::new(root_passphrase),
        }
    }

    /// Replaces the root passphrase.
    pub fn set_root_passphrase(&self, root_passphrase: Option<SecretString>) {
        *self.root_passphrase.write() = root_passphrase;
    }
}

impl RootPassphraseSource for UserInput {
    fn root_passphrase(&self) -> Option<SecretString> {
        self.root_passphrase.read().clone()
    }
}
