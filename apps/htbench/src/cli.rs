use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use htbench_core::presets::Preset;
use htbench_core::sweep::{Ceiling, StressPoint};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug detail, including every rendered command line
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `run` with the universal preset
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a benchmark sweep into a new timestamped directory
    Run(RunArgs),

    /// Parse, summarise and export a finished sweep
    Analyse(AnalyseArgs),
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Sweep preset to start from
    #[arg(long, value_enum, default_value_t = PresetArg::Universal)]
    pub preset: PresetArg,

    /// Tables to run (comma-separated), replacing the preset's
    #[arg(long)]
    pub tables: Option<String>,

    /// Explicit thread counts (comma-separated)
    #[arg(long, conflicts_with_all = ["points", "ceiling", "stress"])]
    pub threads: Option<String>,

    /// Number of interpolation steps between 1 and the ceiling
    #[arg(long)]
    pub points: Option<u32>,

    /// Thread ceiling relative to the host core count
    #[arg(long, value_enum)]
    pub ceiling: Option<CeilingArg>,

    /// Extra over-subscription sample
    #[arg(long, value_enum)]
    pub stress: Option<StressArg>,

    /// Root for timestamped sweep directories
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Root of the per-table build trees
    #[arg(long)]
    pub builds_dir: Option<PathBuf>,

    /// Input file for the sequence preset
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print the command lines without running anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct AnalyseArgs {
    /// Root holding the timestamped sweep directories
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Sweep to analyse (directory name); defaults to the latest
    #[arg(long)]
    pub sweep: Option<String>,

    /// Root for the exported graph data
    #[arg(long)]
    pub graphs_dir: Option<PathBuf>,

    /// Print the summary only
    #[arg(long)]
    pub no_write: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum PresetArg {
    #[default]
    Universal,
    ReadInsert,
    Sequence,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Universal => Preset::Universal,
            PresetArg::ReadInsert => Preset::ReadInsert,
            PresetArg::Sequence => Preset::Sequence,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CeilingArg {
    /// Half the logical cores
    Half,
    /// All logical cores
    All,
}

impl From<CeilingArg> for Ceiling {
    fn from(arg: CeilingArg) -> Self {
        match arg {
            CeilingArg::Half => Ceiling::HalfCores,
            CeilingArg::All => Ceiling::AllCores,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StressArg {
    None,
    /// Repeat the ceiling
    Ceiling,
    /// Twice the ceiling
    Double,
    /// Every logical core
    Cores,
}

impl From<StressArg> for Option<StressPoint> {
    fn from(arg: StressArg) -> Self {
        match arg {
            StressArg::None => None,
            StressArg::Ceiling => Some(StressPoint::AtCeiling),
            StressArg::Double => Some(StressPoint::DoubleCeiling),
            StressArg::Cores => Some(StressPoint::HostCores),
        }
    }
}

/// Splits a comma-separated table list, dropping empty entries.
pub fn parse_tables(list: &str) -> anyhow::Result<Vec<String>> {
    let tables: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if tables.is_empty() {
        bail!("No tables specified");
    }
    Ok(tables)
}

/// Parses a comma-separated list of positive thread counts.
pub fn parse_threads(list: &str) -> anyhow::Result<Vec<u32>> {
    let mut threads = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let count: u32 = item
            .parse()
            .with_context(|| format!("Invalid thread count '{}'", item))?;
        if count == 0 {
            bail!("Thread count must be greater than 0");
        }
        threads.push(count);
    }
    if threads.is_empty() {
        bail!("No thread counts specified");
    }
    Ok(threads)
}
