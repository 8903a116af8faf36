//! # wgf-cli
//!
//! The `wg-federation` command-line interface.
//!
//! Provides commands for:
//! - Salt creation for root passphrase key derivation
//! - HQ bootstrap: fresh keys and `WireGuard` files for every interface
//! - Reconciliation of `WireGuard` files against the HQ state
//! - Private key retrieval for one interface
//!
//! The HQ state is kept encrypted with a key derived from the root
//! passphrase, given through `--root-passphrase` or
//! `WG_FEDERATION_ROOT_PASSPHRASE`.

#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod container;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, HqCommands, SaltCommands, Settings};
pub use container::Container;
pub use error::CliError;
pub use output::OutputFormat;
