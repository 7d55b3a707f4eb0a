//! agerating - age ratings for screenplays
//!
//! Rates scripts 0+/6+/12+/16+/18+ from lexical evidence and the semantic
//! context each scene is presented in.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(cli)
}
