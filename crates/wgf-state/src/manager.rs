//! HQ state lifecycle: bootstrap, reload, update and reconciliation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use ipnet::IpNet;
use serde_json::Value;
use tracing::{debug, info};
use wgf_secrets::SecretString;
use wgf_store::{CanLoadConfiguration, CanSaveConfiguration, ConfigurationLocationFinder, ConfigurationLocker};
use wgf_wireguard::{
    ConfigurationStatus, InterfaceKind, WireGuardError, WireguardConfiguration,
    WireguardInterface, WireguardKeyGenerator,
};

use crate::dispatcher::EventDispatcher;
use crate::error::{Error, Result};
use crate::events::HqEvent;
use crate::state::{Federation, HqState};

/// Name of the bootstrapped forum.
pub const DEFAULT_FORUM_NAME: &str = "wgf-forum0";
/// Name of the bootstrapped phone line.
pub const DEFAULT_PHONE_LINE_NAME: &str = "wgf-phoneline0";
/// Name of the bootstrapped member interface.
pub const DEFAULT_INTERFACE_NAME: &str = wgf_wireguard::DEFAULT_INTERFACE_NAME;

const DEFAULT_FORUM_ADDRESS: &str = "172.32.0.1/22";
const DEFAULT_PHONE_LINE_ADDRESS: &str = "172.32.4.1/22";
const DEFAULT_INTERFACE_ADDRESS: &str = "172.30.8.1/22";

/// The dispatchers HQ events go through, one per payload type.
#[derive(Debug, Default)]
pub struct HqEventDispatcher {
    /// Events carrying the whole state.
    pub state: EventDispatcher<HqEvent, HqState>,
    /// Events carrying federation settings.
    pub federation: EventDispatcher<HqEvent, Federation>,
    /// Events carrying one configuration.
    pub configuration: EventDispatcher<HqEvent, WireguardConfiguration>,
}

/// Owns every read and write of the HQ state file.
///
/// Reads hold the shared lock on the state location, changes hold the
/// exclusive lock from reload to save.
pub struct StateDataManager {
    locations: ConfigurationLocationFinder,
    loader: Arc<dyn CanLoadConfiguration>,
    saver: Arc<dyn CanSaveConfiguration>,
    locker: ConfigurationLocker,
    key_generator: WireguardKeyGenerator,
    events: Arc<HqEventDispatcher>,
}

impl StateDataManager {
    /// Creates a manager.
    #[must_use]
    pub fn new(
        locations: ConfigurationLocationFinder,
        loader: Arc<dyn CanLoadConfiguration>,
        saver: Arc<dyn CanSaveConfiguration>,
        locker: ConfigurationLocker,
        key_generator: WireguardKeyGenerator,
        events: Arc<HqEventDispatcher>,
    ) -> Self {
        Self {
            locations,
            loader,
            saver,
            locker,
            key_generator,
            events,
        }
    }

    /// Loads the state from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateNotBootstrapped`] if there is no state yet, or
    /// any load, validation or subscriber error.
    pub fn reload(&self) -> Result<HqState> {
        let path = self.state_path()?;
        let _lock = self.locker.lock_shared(&path)?;
        self.reload_from_source(&path)
    }

    /// Generates a fresh state with new keys and saves it, replacing any
    /// existing one.
    ///
    /// Each configuration goes through its before-create event, which is
    /// where the reconciler writes the `.ini` files.
    ///
    /// # Errors
    ///
    /// Returns any lock, save, validation or subscriber error.
    pub fn create_hq_state(&self) -> Result<HqState> {
        let path = self.locations.state();
        let state = {
            let _lock = self.locker.lock_exclusively(&path)?;
            let state = self
                .events
                .state
                .dispatch(&[HqEvent::StateBeforeCreate], self.generate_new_hq_state()?)?;
            self.saver.save(&state.to_dict()?, &path)?;
            state
        };
        info!(path = %path.display(), federation = state.federation().name(), "created HQ state");

        let state = self.events.state.dispatch(&[HqEvent::StateCreated], state)?;
        for kind in [InterfaceKind::PhoneLine, InterfaceKind::Forum, InterfaceKind::Interface] {
            for configuration in state.configurations(kind).values() {
                self.events
                    .configuration
                    .dispatch(&[HqEvent::ConfigurationCreated(kind)], configuration.clone())?;
            }
        }
        Ok(state)
    }

    /// Deep-merges `changes` into the saved state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateNotBootstrapped`] if there is no state yet, or
    /// any lock, validation, save or subscriber error.
    pub fn update_hq_state(&self, changes: Value) -> Result<HqState> {
        self.modify_hq_state(|state| state.with_changes(changes))
    }

    /// Applies `changes` to `current` and saves the result in the state.
    ///
    /// The before-update event runs the reconciler when the change moved
    /// the digest, which is then recorded.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] if `changes` would rename
    /// the configuration or change its kind, or any validation,
    /// reconciliation or state update error.
    pub fn update_wireguard_configuration(
        &self,
        changes: Value,
        current: &WireguardConfiguration,
    ) -> Result<WireguardConfiguration> {
        let kind = current.kind();
        let changed = current.with_changes(changes)?;
        if changed.kind() != kind {
            return Err(
                WireGuardError::validation("kind", "cannot be changed by an update").into(),
            );
        }
        if changed.name() != current.name() {
            return Err(
                WireGuardError::validation("name", "cannot be changed by an update").into(),
            );
        }
        let updated = self
            .events
            .configuration
            .dispatch(&[HqEvent::ConfigurationBeforeUpdate(kind)], changed)?;
        let updated = recorded_digest(&updated)?.unwrap_or(updated);
        self.modify_hq_state(|state| Ok(state.with_configuration(updated.clone())))?;
        self.events
            .configuration
            .dispatch(&[HqEvent::ConfigurationUpdated(kind)], updated)
    }

    /// Brings every `.ini` file in line with the saved state and records the
    /// resulting digests.
    ///
    /// Configurations without a recorded digest go through their
    /// before-create event, the others through before-update. Up to date
    /// configurations are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first failure, naming the configuration. Configurations
    /// reconciled before it keep their files but the state is not saved.
    pub fn reconcile_all(&self) -> Result<HqState> {
        self.modify_hq_state(|state| {
            let mut reconciled = state.clone();
            for configuration in state.all_configurations() {
                let kind = configuration.kind();
                let event = if configuration.last_loaded_hash().is_none() {
                    HqEvent::ConfigurationBeforeCreate(kind)
                } else {
                    HqEvent::ConfigurationBeforeUpdate(kind)
                };
                let configuration = self
                    .events
                    .configuration
                    .dispatch(&[event], configuration.clone())
                    .map_err(|e| match e {
                        Error::Reconciliation { .. } => e,
                        other => Error::Reconciliation {
                            kind,
                            name: configuration.name().to_string(),
                            source: Box::new(other),
                        },
                    })?;

                if let Some(recorded) = recorded_digest(&configuration)? {
                    reconciled = reconciled.with_configuration(recorded);
                }
            }
            Ok(reconciled)
        })
    }

    /// Private key of one configuration's interface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationNotFound`] if there is no such
    /// configuration, or any reload error.
    pub fn private_key(&self, kind: InterfaceKind, name: &str) -> Result<SecretString> {
        Ok(self
            .reload()?
            .configuration(kind, name)?
            .interface()
            .private_key()
            .clone())
    }

    fn state_path(&self) -> Result<PathBuf> {
        let path = self.locations.state();
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::StateNotBootstrapped { path })
        }
    }

    fn modify_hq_state<F>(&self, change: F) -> Result<HqState>
    where
        F: FnOnce(HqState) -> Result<HqState>,
    {
        let path = self.state_path()?;
        let updated = {
            let _lock = self.locker.lock_exclusively(&path)?;
            let current = self
                .events
                .state
                .dispatch(&[HqEvent::StateBeforeUpdate], self.reload_from_source(&path)?)?;
            let updated = change(current)?;
            self.saver.save(&updated.to_dict()?, &path)?;
            updated
        };
        debug!(path = %path.display(), "updated HQ state");
        self.events.state.dispatch(&[HqEvent::StateUpdated], updated)
    }

    fn reload_from_source(&self, path: &Path) -> Result<HqState> {
        debug!(path = %path.display(), "reloading HQ state");
        let document = self.loader.load(path).map_err(|e| match e {
            wgf_store::Error::Io { ref source, .. } if source.kind() == io::ErrorKind::NotFound => {
                Error::StateNotBootstrapped {
                    path: path.to_path_buf(),
                }
            }
            other => other.into(),
        })?;
        let state = HqState::from_dict(&Value::Object(document))?;
        self.events.state.dispatch(&[HqEvent::StateLoaded], state)
    }

    fn generate_new_hq_state(&self) -> Result<HqState> {
        let federation = self
            .events
            .federation
            .dispatch(&[HqEvent::FederationBeforeCreate], Federation::default())?;

        let forum = self.new_configuration(
            InterfaceKind::Forum,
            DEFAULT_FORUM_NAME,
            DEFAULT_FORUM_ADDRESS,
            Some(*federation.forum_ports().start()),
            &self.locations.forums_directory(),
        )?;
        let phone_line = self.new_configuration(
            InterfaceKind::PhoneLine,
            DEFAULT_PHONE_LINE_NAME,
            DEFAULT_PHONE_LINE_ADDRESS,
            Some(*federation.phone_line_ports().start()),
            &self.locations.phone_lines_directory(),
        )?;
        let interface = self.new_configuration(
            InterfaceKind::Interface,
            DEFAULT_INTERFACE_NAME,
            DEFAULT_INTERFACE_ADDRESS,
            None,
            &self.locations.interfaces_directory(),
        )?;

        Ok(HqState::new(federation)
            .with_configuration(forum)
            .with_configuration(phone_line)
            .with_configuration(interface))
    }

    fn new_configuration(
        &self,
        kind: InterfaceKind,
        name: &str,
        address: &str,
        listen_port: Option<u16>,
        directory: &Path,
    ) -> Result<WireguardConfiguration> {
        let address: IpNet = address
            .parse()
            .map_err(|e: ipnet::AddrParseError| WireGuardError::validation("interface.address", e.to_string()))?;
        let mut interface = WireguardInterface::builder()
            .key_pair(self.key_generator.generate_key_pair())
            .address(address);
        if let Some(port) = listen_port {
            interface = interface.listen_port(port);
        }

        let configuration = WireguardConfiguration::builder()
            .interface(interface.build()?)
            .name(name)
            .kind(kind)
            .shared_psk(self.key_generator.generate_psk())
            .path(directory.join(format!("{name}.conf")))
            .build()?;
        self.events
            .configuration
            .dispatch(&[HqEvent::ConfigurationBeforeCreate(kind)], configuration)
    }
}

/// Returns the configuration marked active with its current digest, or
/// `None` if that digest is already recorded.
fn recorded_digest(configuration: &WireguardConfiguration) -> Result<Option<WireguardConfiguration>> {
    let digest = configuration.into_sha256_digest();
    if configuration.last_loaded_hash() == Some(digest.as_str()) {
        return Ok(None);
    }
    debug!(
        kind = %configuration.kind(),
        name = configuration.name(),
        "recording configuration digest"
    );
    Ok(Some(
        configuration
            .with_last_loaded(digest, Utc::now())?
            .with_status(ConfigurationStatus::Active),
    ))
}

impl std::fmt::Debug for StateDataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataManager")
            .field("locations", &self.locations)
            .field("locker", &self.locker)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
