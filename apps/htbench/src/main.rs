//! Command-line driver for hash-table benchmark sweeps.
//!
//! `run` executes a sweep of external benchmark binaries into a timestamped
//! results directory; `analyse` parses a finished sweep and exports
//! plot-ready series.

mod cli;
mod commands;

use clap::Parser;
use htbench_core::HarnessConfig;
use tracing::Level;

use cli::{Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = HarnessConfig::default();
    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => commands::run::execute(config, args),
        Commands::Analyse(args) => commands::analyse::execute(config, args),
    }
}
