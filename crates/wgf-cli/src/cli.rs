//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use wgf_wireguard::InterfaceKind;

/// wg-federation - federated `WireGuard` HQ management.
#[derive(Parser, Debug, Clone)]
#[command(name = "wg-federation")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Shared settings.
    #[command(flatten)]
    pub settings: Settings,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings every command shares.
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// Root passphrase protecting the HQ state.
    #[arg(long, global = true, env = "WG_FEDERATION_ROOT_PASSPHRASE", hide_env_values = true)]
    pub root_passphrase: Option<String>,

    /// Directory holding the HQ state and salt.
    #[arg(long, global = true, env = "WG_FEDERATION_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Directory `WireGuard` configuration files are written to.
    #[arg(long, global = true, env = "WG_FEDERATION_WIREGUARD_DIR")]
    pub wireguard_dir: Option<PathBuf>,

    /// Seconds to wait for a file lock. Waits forever when unset.
    #[arg(long, global = true, env = "WG_FEDERATION_LOCK_TIMEOUT_SECS")]
    pub lock_timeout_secs: Option<u64>,
}

impl Settings {
    /// Lock timeout, if any.
    #[must_use]
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_secs.map(Duration::from_secs)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Salt management.
    Salt {
        /// Salt subcommand to execute.
        #[command(subcommand)]
        command: SaltCommands,
    },

    /// HQ state management.
    Hq {
        /// HQ subcommand to execute.
        #[command(subcommand)]
        command: HqCommands,
    },
}

/// Salt subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SaltCommands {
    /// Generate a new salt, invalidating keys derived from the old one.
    Create,
}

/// HQ subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum HqCommands {
    /// Generate a fresh HQ state and write every interface file.
    Bootstrap,

    /// Rewrite interface files that no longer match the state.
    Reconcile,

    /// Print the private key of one interface.
    GetPrivateKey(GetPrivateKeyArgs),
}

/// Arguments of `hq get-private-key`.
#[derive(Args, Debug, Clone)]
pub struct GetPrivateKeyArgs {
    /// Kind of interface: interfaces, forums or `phone_lines`.
    #[arg(long, value_parser = parse_interface_kind)]
    pub interface_kind: InterfaceKind,

    /// Name of the interface.
    #[arg(long)]
    pub interface_name: String,
}

fn parse_interface_kind(value: &str) -> Result<InterfaceKind, String> {
    value.parse().map_err(|e: wgf_wireguard::WireGuardError| e.to_string())
}
