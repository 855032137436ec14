//! `htbench analyse`: parse a finished sweep and export its series.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use htbench_core::manifest::SweepManifest;
use htbench_core::report::{graph_dir_for, render_summary, write_report};
use htbench_core::sweep::latest_sweep_dir;
use htbench_core::{aggregate, HarnessConfig, RecordParser};

use crate::cli::AnalyseArgs;

pub fn execute(config: HarnessConfig, args: AnalyseArgs) -> anyhow::Result<()> {
    let results_root = args
        .results_dir
        .clone()
        .unwrap_or_else(|| config.results_root.clone());
    let graphs_root = args
        .graphs_dir
        .clone()
        .unwrap_or_else(|| config.graphs_root.clone());

    let sweep_dir = resolve_sweep(&results_root, args.sweep.as_deref())?;
    tracing::info!("Analysing {}", sweep_dir.display());

    let report = RecordParser::new(&config).parse_dir(&sweep_dir)?;
    let manifest = match SweepManifest::load(&sweep_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!("Ignoring unreadable manifest in {}: {}", sweep_dir.display(), e);
            None
        }
    };
    let set = aggregate(&report, manifest.as_ref());

    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.file_name, skipped.error);
    }
    println!(
        "{} of {} result files parsed ({} external failures)\n",
        report.records.len(),
        report.total(),
        report.external_failures()
    );
    print!("{}", render_summary(&set));

    if args.no_write || set.is_empty() {
        return Ok(());
    }

    let graph_dir = graph_dir_for(&graphs_root, &sweep_dir);
    let written = write_report(&set, &graph_dir)?;
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn resolve_sweep(results_root: &Path, sweep: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(name) = sweep {
        let dir = results_root.join(name);
        if !dir.is_dir() {
            bail!("Sweep directory {} does not exist", dir.display());
        }
        return Ok(dir);
    }

    match latest_sweep_dir(results_root)
        .with_context(|| format!("Cannot read results root {}", results_root.display()))?
    {
        Some(dir) => Ok(dir),
        None => bail!("No sweep directories under {}", results_root.display()),
    }
}
