//! Harness configuration.

use std::path::{Path, PathBuf};

use crate::workload::Workload;

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root under which each sweep gets a timestamped directory
    pub results_root: PathBuf,
    /// Root for sweeps of the sequence-analysis benchmark
    pub sequence_results_root: PathBuf,
    /// Root under which analysis output is written
    pub graphs_root: PathBuf,
    /// Per-table build trees of the workload-flag benchmark
    pub builds_root: PathBuf,
    /// Per-table build trees of the sequence-analysis benchmark
    pub sequence_builds_root: PathBuf,
    /// Benchmark executable, relative to a table's build tree
    pub universal_binary: PathBuf,
    /// Sequence-analysis executable, relative to a table's build tree
    pub sequence_binary: PathBuf,
    /// FASTA input handed to sequence-analysis trials
    pub sequence_input: PathBuf,
    /// Leading token marking a failed run
    pub failure_marker: String,
    /// Characters stripped from each echoed flag name
    pub flag_prefix_len: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from("results"),
            sequence_results_root: PathBuf::from("fasta_results"),
            graphs_root: PathBuf::from("graphs"),
            builds_root: PathBuf::from("builds"),
            sequence_builds_root: PathBuf::from("fasta_builds"),
            universal_binary: PathBuf::from("tests/universal-benchmark/universal_benchmark"),
            sequence_binary: PathBuf::from("tests/fasta-kmer-benchmark/kmer_benchmark"),
            sequence_input: PathBuf::from(
                "tests/fasta-kmer-benchmark/data/Homo_sapiens.GRCh38.dna.chromosome.22.fa",
            ),
            failure_marker: "FATAL".to_string(),
            flag_prefix_len: 2,
        }
    }
}

impl HarnessConfig {
    /// Path of the executable that runs `workload` against `table`.
    pub fn program_for(&self, table: &str, workload: &Workload) -> PathBuf {
        match workload {
            Workload::Mix(_) => join_build(&self.builds_root, table, &self.universal_binary),
            Workload::Sequence { .. } => {
                join_build(&self.sequence_builds_root, table, &self.sequence_binary)
            }
        }
    }
}

fn join_build(root: &Path, table: &str, binary: &Path) -> PathBuf {
    root.join(table).join(binary)
}
