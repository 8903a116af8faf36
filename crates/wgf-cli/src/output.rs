//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use wgf_state::HqState;
use wgf_wireguard::InterfaceKind;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One configuration of the HQ state, without secrets.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationSummary {
    /// Interface kind.
    pub kind: String,
    /// Interface name.
    pub name: String,
    /// Interface public key.
    pub public_key: String,
    /// Listen port.
    pub listen_port: u16,
    /// Number of peers.
    pub peers: usize,
    /// Path of the `.ini` file.
    pub path: String,
    /// Lifecycle status.
    pub status: String,
}

/// The configurations of an HQ state.
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    /// Federation name.
    pub federation: String,
    /// Configurations, kind by kind.
    pub configurations: Vec<ConfigurationSummary>,
}

impl From<&HqState> for StateSummary {
    fn from(state: &HqState) -> Self {
        let configurations = state
            .all_configurations()
            .map(|c| ConfigurationSummary {
                kind: c.kind().to_string(),
                name: c.name().to_string(),
                public_key: c.interface().public_key().to_string(),
                listen_port: c.interface().listen_port(),
                peers: c.peers().len(),
                path: c.path().display().to_string(),
                status: format!("{:?}", c.status()).to_lowercase(),
            })
            .collect();
        Self {
            federation: state.federation().name().to_string(),
            configurations,
        }
    }
}

impl TableDisplay for StateSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Federation: {}", self.federation)?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{:<12}  {:<15}  {:<44}  {:>5}  {:>5}  {:<6}  PATH",
            "KIND", "NAME", "PUBLIC KEY", "PORT", "PEERS", "STATUS"
        )?;
        writeln!(writer, "{}", "─".repeat(110))?;
        for c in &self.configurations {
            writeln!(
                writer,
                "{:<12}  {:<15}  {:<44}  {:>5}  {:>5}  {:<6}  {}",
                c.kind, c.name, c.public_key, c.listen_port, c.peers, c.status, c.path
            )?;
        }
        Ok(())
    }
}

/// Result of `salt create`.
#[derive(Debug, Clone, Serialize)]
pub struct SaltCreated {
    /// Where the salt was written.
    pub path: String,
}

impl TableDisplay for SaltCreated {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Salt written to {}", self.path)?;
        Ok(())
    }
}

/// Result of `hq get-private-key`.
///
/// Table output is the bare key, so it can be piped into `wg`.
#[derive(Debug, Clone, Serialize)]
pub struct PrivateKeyOutput {
    /// Interface kind.
    pub kind: InterfaceKind,
    /// Interface name.
    pub name: String,
    /// The private key.
    pub private_key: String,
}

impl TableDisplay for PrivateKeyOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.private_key)?;
        Ok(())
    }
}
