//! Fixed sweeps the harness ships with.

use std::fmt;
use std::str::FromStr;

use crate::config::HarnessConfig;
use crate::sweep::{Ceiling, StressPoint, SweepPlan, ThreadSchedule};
use crate::workload::{Workload, WorkloadParams};

/// Named sweep presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Read-only scaling run of the four main tables, up to twice the core count
    Universal,
    /// One run per table at full core count, all-reads and all-inserts
    ReadInsert,
    /// k-mer counting over the configured FASTA input, up to half the
    /// cores plus one run on every core
    Sequence,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Universal, Preset::ReadInsert, Preset::Sequence];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Universal => "universal",
            Preset::ReadInsert => "read-insert",
            Preset::Sequence => "sequence",
        }
    }

    /// The preset's sweep, resolved against `config` and the host core count.
    pub fn plan(self, config: &HarnessConfig, host_cores: usize) -> SweepPlan {
        match self {
            Preset::Universal => SweepPlan {
                name: self.name().to_string(),
                tables: tables(&["folklore", "hopscotch", "libcuckoo", "ndhash"]),
                threads: ThreadSchedule::Interpolated {
                    points: 2,
                    ceiling: Ceiling::AllCores,
                    stress: Some(StressPoint::DoubleCeiling),
                },
                workloads: vec![Workload::Mix(WorkloadParams::all_reads())],
                output_root: config.results_root.clone(),
            },
            Preset::ReadInsert => SweepPlan {
                name: self.name().to_string(),
                tables: tables(&[
                    "empty",
                    "folklore",
                    "libcuckoo",
                    "ndhash",
                    "random",
                    "paralleldp",
                    "ndquad",
                    "hopscotch",
                ]),
                threads: ThreadSchedule::Fixed(vec![Ceiling::AllCores.resolve(host_cores)]),
                workloads: vec![
                    Workload::Mix(
                        WorkloadParams::all_reads()
                            .with_total_ops(100)
                            .with_initial_capacity(25)
                            .with_prefill(75),
                    ),
                    Workload::Mix(
                        WorkloadParams::all_inserts()
                            .with_total_ops(50)
                            .with_initial_capacity(25)
                            .with_prefill(25),
                    ),
                ],
                output_root: config.results_root.join("test4"),
            },
            Preset::Sequence => SweepPlan {
                name: self.name().to_string(),
                tables: tables(&["folklore", "hopscotch", "libcuckoo", "ndhash"]),
                threads: ThreadSchedule::Interpolated {
                    points: 5,
                    ceiling: Ceiling::HalfCores,
                    stress: Some(StressPoint::HostCores),
                },
                workloads: vec![Workload::Sequence {
                    input_file: config.sequence_input.clone(),
                }],
                output_root: config.sequence_results_root.clone(),
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown preset '{}'", s))
    }
}

fn tables(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_universal_trials() {
        let plan = Preset::Universal.plan(&HarnessConfig::default(), 8);
        let trials = plan.generate(8).unwrap();
        // 4 tables x (1, 4, 8, 16)
        assert_eq!(trials.len(), 16);
        let threads: Vec<u32> = trials.iter().take(4).map(|t| t.thread_count()).collect();
        assert_eq!(threads, vec![1, 4, 8, 16]);
        assert_eq!(plan.output_root, PathBuf::from("results"));
    }

    #[test]
    fn test_read_insert_trials() {
        let plan = Preset::ReadInsert.plan(&HarnessConfig::default(), 12);
        let trials = plan.generate(12).unwrap();
        assert_eq!(trials.len(), 16);
        assert_eq!(trials[0].output_name(), "empty_12_threads_100_0_0");
        assert_eq!(trials[1].output_name(), "empty_12_threads_0_100_0");
        assert_eq!(plan.output_root, PathBuf::from("results/test4"));
    }

    #[test]
    fn test_sequence_trials() {
        let plan = Preset::Sequence.plan(&HarnessConfig::default(), 16);
        let trials = plan.generate(16).unwrap();
        // half of 16 cores: 1, 2, 3, 5, 6, 8 plus 16
        assert_eq!(trials.len(), 4 * 7);
        assert_eq!(trials[6].thread_count(), 16);
        assert_eq!(trials[0].output_name(), "folklore_1_threads.txt");
        assert_eq!(plan.output_root, PathBuf::from("fasta_results"));
    }

    #[test]
    fn test_sequence_stress_uses_every_core() {
        for (cores, expected) in [(7, vec![1, 1, 1, 2, 2, 3, 7]), (1, vec![1; 7])] {
            let plan = Preset::Sequence.plan(&HarnessConfig::default(), cores);
            let threads: Vec<u32> = plan
                .generate(cores)
                .unwrap()
                .iter()
                .filter(|t| t.table() == "folklore")
                .map(|t| t.thread_count())
                .collect();
            assert_eq!(threads, expected, "{} cores", cores);
        }
    }

    #[test]
    fn test_from_str() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert!("nope".parse::<Preset>().is_err());
    }
}
