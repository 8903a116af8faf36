//! Keeps `WireGuard` `.ini` files in line with their configurations.

use std::sync::Arc;

use tracing::info;
use wgf_store::{ConfigurationLocker, restrict_permissions, write_atomically_with};
use wgf_wireguard::{InterfaceKind, WireguardConfiguration, write_ini};

use crate::dispatcher::{EventDispatcher, EventSubscriber};
use crate::error::{Error, Result};
use crate::events::{HqEvent, WireguardConfigurationEvent};

/// Where a configuration stands relative to its file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationState {
    /// Never reconciled: no recorded digest.
    New,
    /// The recorded digest matches the configuration.
    UpToDate,
    /// The recorded digest differs from the configuration.
    Stale,
}

impl ReconciliationState {
    /// Compares the recorded digest with the current one.
    #[must_use]
    pub fn of(configuration: &WireguardConfiguration) -> Self {
        match configuration.last_loaded_hash() {
            None => Self::New,
            Some(hash) if hash == configuration.into_sha256_digest() => Self::UpToDate,
            Some(_) => Self::Stale,
        }
    }
}

/// Rewrites a configuration's `.ini` file whenever its digest moved.
///
/// Subscribed to the before-create and before-update events of every
/// interface kind. The file is replaced atomically under the exclusive lock
/// and left `0600`. File events go to `file_events` before and after the
/// write.
#[derive(Debug)]
pub struct WireguardInterfaceConfigurationReconciler {
    locker: ConfigurationLocker,
    file_events: Arc<EventDispatcher<WireguardConfigurationEvent, WireguardConfiguration>>,
}

impl WireguardInterfaceConfigurationReconciler {
    /// Creates a reconciler.
    #[must_use]
    pub fn new(
        locker: ConfigurationLocker,
        file_events: Arc<EventDispatcher<WireguardConfigurationEvent, WireguardConfiguration>>,
    ) -> Self {
        Self {
            locker,
            file_events,
        }
    }

    fn write(&self, configuration: &WireguardConfiguration) -> Result<()> {
        let path = configuration.path();
        let sections = configuration.into_wireguard_ini();
        let _lock = self.locker.lock_exclusively(path)?;
        write_atomically_with(path, |file| write_ini(file, &sections))?;
        restrict_permissions(path)?;
        Ok(())
    }

    fn reconcile(&self, configuration: WireguardConfiguration) -> Result<WireguardConfiguration> {
        let state = ReconciliationState::of(&configuration);
        let (before, after) = if state == ReconciliationState::New {
            (
                WireguardConfigurationEvent::ConfigurationFileBeforeCreate,
                WireguardConfigurationEvent::ConfigurationFileCreated,
            )
        } else {
            (
                WireguardConfigurationEvent::ConfigurationFileBeforeUpdate,
                WireguardConfigurationEvent::ConfigurationFileUpdated,
            )
        };

        let configuration = self.file_events.dispatch(&[before], configuration)?;
        self.write(&configuration)?;
        info!(
            kind = %configuration.kind(),
            name = configuration.name(),
            path = %configuration.path().display(),
            ?state,
            "reconciled WireGuard configuration file"
        );
        self.file_events.dispatch(&[after], configuration)
    }
}

impl EventSubscriber<HqEvent, WireguardConfiguration> for WireguardInterfaceConfigurationReconciler {
    fn subscribed_events(&self) -> Vec<HqEvent> {
        InterfaceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                [
                    HqEvent::ConfigurationBeforeCreate(kind),
                    HqEvent::ConfigurationBeforeUpdate(kind),
                ]
            })
            .collect()
    }

    fn should_run(&self, configuration: &WireguardConfiguration) -> bool {
        ReconciliationState::of(configuration) != ReconciliationState::UpToDate
    }

    fn run(&self, configuration: WireguardConfiguration) -> Result<WireguardConfiguration> {
        let kind = configuration.kind();
        let name = configuration.name().to_string();
        self.reconcile(configuration)
            .map_err(|source| Error::Reconciliation {
                kind,
                name,
                source: Box::new(source),
            })
    }

    fn name(&self) -> &'static str {
        "wireguard-interface-configuration-reconciler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use wgf_wireguard::{WireguardInterface, WireguardKeyGenerator, WireguardPeer, render_ini};

    const PEER: &str = "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=";

    // ==== Helper Functions ====

    fn configuration(path: &Path) -> WireguardConfiguration {
        let generator = WireguardKeyGenerator::new();
        WireguardConfiguration::builder()
            .interface(
                WireguardInterface::builder()
                    .key_pair(generator.generate_key_pair())
                    .address("172.30.8.1/22".parse().expect("net"))
                    .build()
                    .expect("interface"),
            )
            .peer(
                WireguardPeer::builder()
                    .public_key(PEER)
                    .allowed_ip("172.30.8.2/32".parse().expect("net"))
                    .build()
                    .expect("peer"),
            )
            .name("wg0")
            .shared_psk(generator.generate_psk())
            .path(path)
            .build()
            .expect("configuration")
    }

    fn recorded(configuration: &WireguardConfiguration) -> WireguardConfiguration {
        configuration
            .with_last_loaded(configuration.into_sha256_digest(), Utc::now())
            .expect("digest")
    }

    type EventLog = Arc<Mutex<Vec<(WireguardConfigurationEvent, bool)>>>;

    struct Recorder {
        event: WireguardConfigurationEvent,
        log: EventLog,
    }

    impl EventSubscriber<WireguardConfigurationEvent, WireguardConfiguration> for Recorder {
        fn subscribed_events(&self) -> Vec<WireguardConfigurationEvent> {
            vec![self.event]
        }

        fn run(&self, configuration: WireguardConfiguration) -> Result<WireguardConfiguration> {
            self.log.lock().push((self.event, configuration.path().exists()));
            Ok(configuration)
        }
    }

    fn reconciler() -> (WireguardInterfaceConfigurationReconciler, EventLog) {
        let log = EventLog::default();
        let file_events = Arc::new(EventDispatcher::new());
        for event in [
            WireguardConfigurationEvent::ConfigurationFileBeforeCreate,
            WireguardConfigurationEvent::ConfigurationFileCreated,
            WireguardConfigurationEvent::ConfigurationFileBeforeUpdate,
            WireguardConfigurationEvent::ConfigurationFileUpdated,
        ] {
            file_events.register(Arc::new(Recorder {
                event,
                log: Arc::clone(&log),
            }));
        }
        (
            WireguardInterfaceConfigurationReconciler::new(ConfigurationLocker::default(), file_events),
            log,
        )
    }

    // ==== State ====

    #[test]
    fn state_follows_recorded_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let configuration = configuration(&dir.path().join("wg0.conf"));
        assert_eq!(ReconciliationState::of(&configuration), ReconciliationState::New);

        let recorded = recorded(&configuration);
        assert_eq!(ReconciliationState::of(&recorded), ReconciliationState::UpToDate);

        let changed = recorded
            .with_changes(serde_json::json!({"interface": {"listen_port": 10100}}))
            .expect("change");
        assert_eq!(ReconciliationState::of(&changed), ReconciliationState::Stale);
    }

    // ==== Run ====

    #[test]
    fn writes_ini_and_restricts_permissions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("interfaces").join("wg0.conf");
        let configuration = configuration(&path);
        let (reconciler, _) = reconciler();

        assert!(reconciler.should_run(&configuration));
        let returned = reconciler.run(configuration.clone()).expect("run");

        assert_eq!(returned, configuration);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            render_ini(&configuration.into_wireguard_ini())
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn second_pass_with_recorded_digest_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (reconciler, _) = reconciler();
        let configuration = reconciler
            .run(configuration(&dir.path().join("wg0.conf")))
            .expect("run");

        assert!(!reconciler.should_run(&recorded(&configuration)));
    }

    #[test]
    fn changed_peer_marks_configuration_for_rewrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        let (reconciler, _) = reconciler();
        let configuration = recorded(&reconciler.run(configuration(&path)).expect("run"));

        let changed = configuration
            .with_changes(serde_json::json!({
                "peers": [{"public_key": PEER, "allowed_ips": ["172.30.8.3/32"]}]
            }))
            .expect("change");
        assert!(reconciler.should_run(&changed));

        reconciler.run(changed).expect("rewrite");
        assert!(fs::read_to_string(&path).expect("read").contains("172.30.8.3/32"));
    }

    #[test]
    fn dispatches_file_events_around_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        let (reconciler, log) = reconciler();
        let configuration = reconciler.run(configuration(&path)).expect("create");
        reconciler
            .run(recorded(&configuration).with_changes(serde_json::json!({"peers": []})).expect("change"))
            .expect("update");

        assert_eq!(
            *log.lock(),
            vec![
                (WireguardConfigurationEvent::ConfigurationFileBeforeCreate, false),
                (WireguardConfigurationEvent::ConfigurationFileCreated, true),
                (WireguardConfigurationEvent::ConfigurationFileBeforeUpdate, true),
                (WireguardConfigurationEvent::ConfigurationFileUpdated, true),
            ]
        );
    }

    #[test]
    fn write_failure_names_configuration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-directory");
        fs::write(&blocker, b"").expect("write");
        let (reconciler, _) = reconciler();

        let err = reconciler
            .run(configuration(&blocker.join("wg0.conf")))
            .expect_err("must fail");
        assert!(matches!(
            err,
            Error::Reconciliation { kind: InterfaceKind::Interface, ref name, .. } if name == "wg0"
        ));
    }

    #[test]
    fn subscribes_to_before_events_of_every_kind() {
        let (reconciler, _) = reconciler();
        let events = reconciler.subscribed_events();
        assert_eq!(events.len(), 6);
        assert!(events.contains(&HqEvent::ConfigurationBeforeUpdate(InterfaceKind::PhoneLine)));
        assert!(!events.contains(&HqEvent::ConfigurationCreated(InterfaceKind::Forum)));
    }
}
