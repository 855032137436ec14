//! Trial execution: one blocking external process per trial.
//!
//! Standard output of each process goes to its own file in the sweep
//! directory. Exit codes are logged but not acted on; a run that
//! produced no record is classified later, when its file is parsed.

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::manifest::SweepManifest;
use crate::sweep::SweepContext;
use crate::workload::Trial;

/// How a trial's process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStatus {
    /// Process ran; exit code if it exited normally
    Exited(Option<i32>),
    /// Process could not be started
    SpawnFailed(String),
}

impl TrialStatus {
    fn from_exit(status: ExitStatus) -> Self {
        TrialStatus::Exited(status.code())
    }
}

/// Result of running one trial.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub trial: Trial,
    pub output: PathBuf,
    pub status: TrialStatus,
    pub elapsed: Duration,
}

/// Totals for a finished sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub outcomes: Vec<TrialOutcome>,
}

impl SweepSummary {
    pub fn launched(&self) -> usize {
        self.outcomes.len()
    }

    /// Trials whose executable could not be started.
    pub fn spawn_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TrialStatus::SpawnFailed(_)))
            .count()
    }

    /// Trials whose process exited non-zero or by signal.
    pub fn abnormal_exits(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TrialStatus::Exited(code) if code != Some(0)))
            .count()
    }
}

/// Renders trials into commands and runs them one at a time.
#[derive(Debug, Clone)]
pub struct TrialRunner {
    config: HarnessConfig,
}

impl TrialRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Process invocation for `trial`, without output redirection.
    pub fn command(&self, trial: &Trial) -> Command {
        let mut command = Command::new(self.config.program_for(trial.table(), trial.workload()));
        command.args(trial.args());
        command
    }

    /// Shell-style rendering of the invocation, for logs and dry runs.
    pub fn render(&self, trial: &Trial, output: &str) -> String {
        format!(
            "{} {} > {}",
            self.config
                .program_for(trial.table(), trial.workload())
                .display(),
            trial.args().join(" "),
            output
        )
    }

    /// Runs `trial`, writing its standard output to `output_name` in the sweep directory.
    ///
    /// Blocks until the process exits. Only failing to create the output
    /// file is an error; a missing or crashing executable is reported in
    /// the outcome.
    pub fn run_trial(
        &self,
        context: &SweepContext,
        trial: &Trial,
        output_name: &str,
    ) -> Result<TrialOutcome, HarnessError> {
        let output = context.output_path(output_name);
        let file = File::create(&output).map_err(|e| {
            HarnessError::Filesystem(format!(
                "Failed to create output file {}: {}",
                output.display(),
                e
            ))
        })?;

        tracing::debug!("{}", self.render(trial, output_name));

        let start = Instant::now();
        let status = match self
            .command(trial)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .status()
        {
            Ok(status) => {
                if !status.success() {
                    tracing::warn!("{} exited with {}", output_name, status);
                }
                TrialStatus::from_exit(status)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to start {} for {}: {}",
                    self.config
                        .program_for(trial.table(), trial.workload())
                        .display(),
                    output_name,
                    e
                );
                TrialStatus::SpawnFailed(e.to_string())
            }
        };

        Ok(TrialOutcome {
            trial: trial.clone(),
            output,
            status,
            elapsed: start.elapsed(),
        })
    }

    /// Runs every trial in order and records them in the sweep manifest.
    ///
    /// The manifest is written before the first trial starts, so an
    /// interrupted sweep still describes what it intended to run.
    ///
    /// # Arguments
    /// * `context` - Sweep directory to write into
    /// * `plan_name` - Plan name recorded in the manifest
    /// * `trials` - Trials in run order
    /// * `host_cores` - Logical core count recorded in the manifest
    ///
    /// # Returns
    /// `Result<SweepSummary, HarnessError>`; per-trial failures never make this an error.
    pub fn run_sweep(
        &self,
        context: &SweepContext,
        plan_name: &str,
        trials: &[Trial],
        host_cores: usize,
    ) -> Result<SweepSummary, HarnessError> {
        let names = assign_output_names(trials);

        let mut manifest = SweepManifest::new(plan_name, context.timestamp(), host_cores);
        for (trial, name) in trials.iter().zip(&names) {
            manifest.push(name.clone(), trial.clone());
        }
        manifest.save(context.sweep_dir())?;

        let mut summary = SweepSummary::default();
        for (index, (trial, name)) in trials.iter().zip(&names).enumerate() {
            tracing::info!("[{}/{}] {}", index + 1, trials.len(), name);
            let outcome = self.run_trial(context, trial, name)?;
            summary.outcomes.push(outcome);
        }

        tracing::info!(
            "Sweep {} finished: {} trials, {} failed to start, {} exited abnormally",
            context.timestamp(),
            summary.launched(),
            summary.spawn_failures(),
            summary.abnormal_exits()
        );
        Ok(summary)
    }
}

/// Output file names for `trials`, in order.
///
/// A name seen before gets `_rep2`, `_rep3`, ... so repeated trials keep
/// their own files.
pub fn assign_output_names(trials: &[Trial]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    trials
        .iter()
        .map(|trial| {
            let base = trial.output_name();
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}_rep{}", base, count)
            }
        })
        .collect()
}
