//! cenarius-probe sends a short, fixed sequence of requests to a Cenarius
//! server to check that logging in and the private endpoints work, and prints
//! every response it gets.

#[macro_use]
extern crate anyhow;

use std::io;

use anyhow::Result;
use clap::Parser;

use crate::{
    authentication::Mode,
    configuration::{Cli, Commands, Configuration},
    probe::Probe,
};

mod authentication;
mod configuration;
mod endpoints;
mod header;
mod probe;
mod version;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(partial) = cli.command.partial_config() else {
        version::print_version();
        return Ok(());
    };
    let config = Configuration::load(partial)?;
    setup_logging(&config);
    log::debug!("Configuration: target {}, login {}", config.target, config.login);

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Version => Ok(()),
        Commands::Session { .. } => Probe::new(&config, Mode::Session, out)?.session(),
        Commands::Token { .. } => Probe::new(&config, Mode::Token, out)?.token(),
        Commands::Register { .. } => Probe::new(&config, Mode::None, out)?.register(),
        Commands::List { kind, .. } => Probe::new(&config, Mode::Token, out)?.list(kind),
        Commands::VerifyAuth { .. } => {
            authentication::verify_auth::verify_auth(&config, &mut out)
        }
    }
}

/// Sends log output to stderr at the configured level, so it never mixes
/// with the report on stdout.
fn setup_logging(config: &Configuration) {
    env_logger::Builder::new()
        .filter_level(config.log_level)
        .target(env_logger::Target::Stderr)
        .init();
}
