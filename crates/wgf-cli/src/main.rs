//! wg-federation CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wgf_cli::cli::{Cli, Commands};
use wgf_cli::commands::{HqCommand, SaltCommand};
use wgf_cli::{Container, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let container = Container::new(&cli.settings);
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Salt { command } => SaltCommand::new(&container)
            .execute(&mut stdout, &format, *command)
            .context("salt command failed"),
        Commands::Hq { command } => HqCommand::new(&container)
            .execute(&mut stdout, &format, command)
            .context("hq command failed"),
    }
}
