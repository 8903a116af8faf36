//! HQ command implementation.

use std::io::Write;

use tracing::info;

use crate::cli::{GetPrivateKeyArgs, HqCommands};
use crate::container::Container;
use crate::error::CliError;
use crate::output::{OutputFormat, PrivateKeyOutput, StateSummary};

/// HQ command executor.
pub struct HqCommand<'a> {
    container: &'a Container,
}

impl<'a> HqCommand<'a> {
    /// Create a new HQ command.
    #[must_use]
    pub const fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Execute an HQ subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the state operation or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &HqCommands,
    ) -> Result<(), CliError> {
        // Every hq command touches encrypted state; fail before any file is written.
        self.container.key_deriver().derive_32b_key_from_root_passphrase()?;
        match command {
            HqCommands::Bootstrap => {
                let state = self.container.state_manager().create_hq_state()?;
                info!(federation = state.federation().name(), "HQ bootstrapped");
                format.write(writer, &StateSummary::from(&state))
            }
            HqCommands::Reconcile => {
                let state = self.container.state_manager().reconcile_all()?;
                format.write(writer, &StateSummary::from(&state))
            }
            HqCommands::GetPrivateKey(args) => self.get_private_key(writer, format, args),
        }
    }

    fn get_private_key<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &GetPrivateKeyArgs,
    ) -> Result<(), CliError> {
        let private_key = self
            .container
            .state_manager()
            .private_key(args.interface_kind, &args.interface_name)?;
        let output = PrivateKeyOutput {
            kind: args.interface_kind,
            name: args.interface_name.clone(),
            private_key: private_key.expose().to_string(),
        };
        format.write(writer, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Format, Settings};
    use tempfile::TempDir;
    use wgf_wireguard::InterfaceKind;

    fn container(dir: &TempDir) -> Container {
        let container = Container::new(&Settings {
            root_passphrase: Some("correct horse battery staple".to_string()),
            state_dir: Some(dir.path().join("state")),
            wireguard_dir: Some(dir.path().join("wireguard")),
            lock_timeout_secs: Some(5),
        });
        container.key_deriver().create_salt().expect("salt");
        container
    }

    fn run(container: &Container, format: Format, command: &HqCommands) -> Result<String, CliError> {
        let mut out = Vec::new();
        HqCommand::new(container).execute(&mut out, &OutputFormat::new(format), command)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn bootstrap_then_reconcile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = container(&dir);

        let out = run(&container, Format::Table, &HqCommands::Bootstrap).expect("bootstrap");
        assert!(out.contains("wgf-forum0"));
        assert!(dir.path().join("wireguard/forums/wgf-forum0.conf").is_file());

        let out = run(&container, Format::Json, &HqCommands::Reconcile).expect("reconcile");
        let summary: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(summary["configurations"].as_array().map(Vec::len), Some(3));
        assert!(
            summary["configurations"]
                .as_array()
                .into_iter()
                .flatten()
                .all(|c| c["status"] == "active")
        );
    }

    #[test]
    fn get_private_key_prints_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = container(&dir);
        run(&container, Format::Table, &HqCommands::Bootstrap).expect("bootstrap");

        let out = run(
            &container,
            Format::Table,
            &HqCommands::GetPrivateKey(GetPrivateKeyArgs {
                interface_kind: InterfaceKind::Interface,
                interface_name: "wg-federation0".to_string(),
            }),
        )
        .expect("key");
        assert_eq!(out.trim_end().len(), 44);
    }

    #[test]
    fn commands_without_passphrase_report_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        container(&dir);
        let without = Container::new(&Settings {
            root_passphrase: None,
            state_dir: Some(dir.path().join("state")),
            wireguard_dir: Some(dir.path().join("wireguard")),
            lock_timeout_secs: Some(5),
        });

        for command in [
            HqCommands::Bootstrap,
            HqCommands::Reconcile,
            HqCommands::GetPrivateKey(GetPrivateKeyArgs {
                interface_kind: InterfaceKind::Interface,
                interface_name: "wg-federation0".to_string(),
            }),
        ] {
            let err = run(&without, Format::Table, &command).expect_err("no passphrase");
            assert!(matches!(
                err,
                CliError::Secrets(wgf_secrets::Error::RootPassphraseNotSet)
            ));
        }
        assert!(!dir.path().join("wireguard").exists());
    }

    #[test]
    fn reconcile_before_bootstrap_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run(&container(&dir), Format::Table, &HqCommands::Reconcile).expect_err("no state");
        assert!(matches!(
            err,
            CliError::State(wgf_state::Error::StateNotBootstrapped { .. })
        ));
    }
}
