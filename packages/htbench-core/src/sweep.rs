//! Sweep generation and the per-sweep output context.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use crate::error::{classify_io_error, HarnessError};
use crate::workload::{Trial, Workload};

/// Timestamp layout of sweep directory names. Sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Logical cores of this host.
pub fn host_cores() -> usize {
    num_cpus::get()
}

/// Upper bound of an interpolated thread schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    /// Half the host's logical cores
    HalfCores,
    /// All logical cores
    AllCores,
}

impl Ceiling {
    /// Maximum thread count `M` on a host with `host_cores` logical cores.
    pub fn resolve(self, host_cores: usize) -> u32 {
        let cores = u32::try_from(host_cores).unwrap_or(u32::MAX);
        let m = match self {
            Ceiling::HalfCores => cores / 2,
            Ceiling::AllCores => cores,
        };
        m.max(1)
    }
}

/// Extra sample appended after the interpolated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressPoint {
    /// One more run at `M`
    AtCeiling,
    /// Oversubscribed run at `2 * M`
    DoubleCeiling,
    /// One run per logical core, whatever the ceiling
    HostCores,
}

impl StressPoint {
    /// Thread count of the extra sample for ceiling `max`.
    pub fn resolve(self, max: u32, host_cores: usize) -> u32 {
        match self {
            StressPoint::AtCeiling => max.max(1),
            StressPoint::DoubleCeiling => max.max(1).saturating_mul(2),
            StressPoint::HostCores => Ceiling::AllCores.resolve(host_cores),
        }
    }
}

/// How the thread counts of a sweep are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadSchedule {
    /// `points + 1` samples from 1 up to the ceiling, plus an optional stress point
    Interpolated {
        points: u32,
        ceiling: Ceiling,
        stress: Option<StressPoint>,
    },
    /// Explicit thread counts, used as given
    Fixed(Vec<u32>),
}

impl ThreadSchedule {
    /// Thread counts for a host with `host_cores` logical cores.
    pub fn samples(&self, host_cores: usize) -> Vec<u32> {
        match self {
            ThreadSchedule::Interpolated {
                points,
                ceiling,
                stress,
            } => {
                let max = ceiling.resolve(host_cores);
                let extra = stress.map(|point| point.resolve(max, host_cores));
                sample_threads(*points, max, extra)
            }
            ThreadSchedule::Fixed(threads) => threads.clone(),
        }
    }
}

/// Samples `floor(i / points * (max - 1)) + 1` for `i` in `0..=points`,
/// then `extra` when given.
///
/// Repeated values are kept. `points == 0` yields `[1]`.
pub fn sample_threads(points: u32, max: u32, extra: Option<u32>) -> Vec<u32> {
    let max = max.max(1);
    let span = u64::from(max - 1);

    let mut samples: Vec<u32> = if points == 0 {
        vec![1]
    } else {
        (0..=u64::from(points))
            .map(|i| (i * span / u64::from(points)) as u32 + 1)
            .collect()
    };

    if let Some(extra) = extra {
        samples.push(extra);
    }

    samples
}

/// A named cross product of tables, thread counts and workloads.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    /// Plan name, recorded in the manifest
    pub name: String,
    /// Table identifiers, in run order
    pub tables: Vec<String>,
    /// Thread-count schedule
    pub threads: ThreadSchedule,
    /// Workload presets, in run order
    pub workloads: Vec<Workload>,
    /// Directory receiving the timestamped sweep directory
    pub output_root: PathBuf,
}

impl SweepPlan {
    /// Expands the plan into trials, ordered table, then thread count, then workload.
    ///
    /// # Arguments
    /// * `host_cores` - Logical core count used to resolve the thread ceiling
    ///
    /// # Returns
    /// `Result<Vec<Trial>, HarnessError>` with one trial per combination.
    pub fn generate(&self, host_cores: usize) -> Result<Vec<Trial>, HarnessError> {
        if self.tables.is_empty() {
            return Err(HarnessError::InvalidPlan(format!(
                "plan '{}' names no tables",
                self.name
            )));
        }
        if self.workloads.is_empty() {
            return Err(HarnessError::InvalidPlan(format!(
                "plan '{}' names no workloads",
                self.name
            )));
        }

        let threads = self.threads.samples(host_cores);
        if threads.is_empty() || threads.contains(&0) {
            return Err(HarnessError::InvalidPlan(format!(
                "plan '{}' has unusable thread counts {:?}",
                self.name, threads
            )));
        }

        let mut trials = Vec::with_capacity(self.tables.len() * threads.len() * self.workloads.len());
        for table in &self.tables {
            for &thread_count in &threads {
                for workload in &self.workloads {
                    trials.push(Trial::new(table.clone(), thread_count, workload.clone()));
                }
            }
        }
        Ok(trials)
    }
}

/// Where one sweep writes: `<results_root>/<timestamp>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepContext {
    results_root: PathBuf,
    timestamp: String,
    sweep_dir: PathBuf,
}

impl SweepContext {
    /// Creates the sweep directory stamped with the current UTC time.
    pub fn create(results_root: &Path) -> Result<Self, HarnessError> {
        Self::create_at(results_root, Utc::now())
    }

    /// Creates the sweep directory stamped with `started_at`.
    ///
    /// Fails if the directory already exists, so two sweeps never share
    /// an output directory.
    pub fn create_at(results_root: &Path, started_at: DateTime<Utc>) -> Result<Self, HarnessError> {
        let context = Self::planned(results_root, started_at);

        fs::create_dir_all(&context.results_root).map_err(|e| {
            HarnessError::Filesystem(format!(
                "Failed to create results root {}: {}",
                context.results_root.display(),
                e
            ))
        })?;
        fs::create_dir(&context.sweep_dir).map_err(|e| {
            HarnessError::Filesystem(format!(
                "Failed to create sweep directory {}: {}",
                context.sweep_dir.display(),
                e
            ))
        })?;

        tracing::info!("Created sweep directory {}", context.sweep_dir.display());
        Ok(context)
    }

    /// Context for `started_at` without touching the filesystem.
    pub fn planned(results_root: &Path, started_at: DateTime<Utc>) -> Self {
        let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();
        Self {
            results_root: results_root.to_path_buf(),
            sweep_dir: results_root.join(&timestamp),
            timestamp,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    pub fn sweep_dir(&self) -> &Path {
        &self.sweep_dir
    }

    /// Path of the output file called `name` inside this sweep.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.sweep_dir.join(name)
    }
}

/// Most recent sweep directory under `results_root`.
///
/// Only directories named with [`TIMESTAMP_FORMAT`] count, so fixed
/// subdirectories such as `test4` are ignored. Timestamps sort
/// lexicographically, so the greatest name wins.
pub fn latest_sweep_dir(results_root: &Path) -> Result<Option<PathBuf>, HarnessError> {
    let entries = fs::read_dir(results_root).map_err(|e| {
        classify_io_error(
            e,
            &format!("Failed to list results root {}", results_root.display()),
        )
    })?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry = entry.map_err(|e| classify_io_error(e, "Failed to read directory entry"))?;
        let path = entry.path();
        if !path.is_dir() || !is_sweep_name(&path) {
            continue;
        }
        if latest
            .as_ref()
            .map_or(true, |best| path.file_name() > best.file_name())
        {
            latest = Some(path);
        }
    }
    Ok(latest)
}

fn is_sweep_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| {
            NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).is_ok()
        })
}
