//! Wires the library components together for one CLI invocation.

use std::sync::Arc;

use wgf_secrets::{
    CryptographicKeyDeriver, DecryptConfigurationLoader, EncryptConfigurationSaver,
    MessageEncrypter, SecretString, UserInput,
};
use wgf_state::{
    EventDispatcher, HqEventDispatcher, StateDataManager, WireguardInterfaceConfigurationReconciler,
};
use wgf_store::{
    CanLoadConfiguration, CanSaveConfiguration, ConfigurationLoader, ConfigurationLocationFinder,
    ConfigurationLocker, ConfigurationSaver,
};
use wgf_wireguard::WireguardKeyGenerator;

use crate::cli::Settings;

/// Every long-lived component, built once from [`Settings`].
///
/// The HQ state is loaded and saved through the encryption proxies, so any
/// state operation needs the root passphrase. Salt creation does not.
#[derive(Debug)]
pub struct Container {
    locations: ConfigurationLocationFinder,
    key_deriver: Arc<CryptographicKeyDeriver>,
    state_manager: StateDataManager,
}

impl Container {
    /// Builds the components for `settings`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let mut locations = ConfigurationLocationFinder::default();
        if let Some(directory) = &settings.state_dir {
            locations = locations.with_state_directory(directory);
        }
        if let Some(directory) = &settings.wireguard_dir {
            locations = locations.with_wireguard_directory(directory);
        }
        let locker = ConfigurationLocker::new(settings.lock_timeout());

        let loader: Arc<dyn CanLoadConfiguration> = Arc::new(ConfigurationLoader::default());
        let saver: Arc<dyn CanSaveConfiguration> = Arc::new(ConfigurationSaver::default());
        let user_input = Arc::new(UserInput::new(
            settings.root_passphrase.as_deref().map(SecretString::new),
        ));
        let key_deriver = Arc::new(
            CryptographicKeyDeriver::new(
                user_input,
                locations.clone(),
                Arc::clone(&loader),
                Arc::clone(&saver),
            )
            .with_locker(locker.clone()),
        );
        let encrypter = Arc::new(MessageEncrypter::new(Arc::clone(&key_deriver)));

        let events = Arc::new(HqEventDispatcher::default());
        events
            .configuration
            .register(Arc::new(WireguardInterfaceConfigurationReconciler::new(
                locker.clone(),
                Arc::new(EventDispatcher::new()),
            )));

        let state_manager = StateDataManager::new(
            locations.clone(),
            Arc::new(DecryptConfigurationLoader::new(loader, Arc::clone(&encrypter))),
            Arc::new(EncryptConfigurationSaver::new(saver, encrypter)),
            locker,
            WireguardKeyGenerator::new(),
            events,
        );

        Self {
            locations,
            key_deriver,
            state_manager,
        }
    }

    /// Resolved file locations.
    #[must_use]
    pub const fn locations(&self) -> &ConfigurationLocationFinder {
        &self.locations
    }

    /// The root passphrase key deriver.
    #[must_use]
    pub fn key_deriver(&self) -> &CryptographicKeyDeriver {
        &self.key_deriver
    }

    /// The HQ state manager.
    #[must_use]
    pub const fn state_manager(&self) -> &StateDataManager {
        &self.state_manager
    }
}
