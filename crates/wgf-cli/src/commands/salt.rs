//! Salt command implementation.

use std::io::Write;

use crate::cli::SaltCommands;
use crate::container::Container;
use crate::error::CliError;
use crate::output::{OutputFormat, SaltCreated};

/// Salt command executor.
pub struct SaltCommand<'a> {
    container: &'a Container,
}

impl<'a> SaltCommand<'a> {
    /// Create a new salt command.
    #[must_use]
    pub const fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Execute a salt subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt cannot be written or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: SaltCommands,
    ) -> Result<(), CliError> {
        match command {
            SaltCommands::Create => {
                self.container.key_deriver().create_salt()?;
                let created = SaltCreated {
                    path: self.container.locations().salt().display().to_string(),
                };
                format.write(writer, &created)
            }
        }
    }
}
