//! Trial definitions: what one benchmark invocation runs.
//!
//! Values are passed to the external binaries uninterpreted. The
//! binaries are the only validators of ranges and mix sums.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters of a workload-flag benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadParams {
    /// Total operation count (`--total-ops`)
    pub total_ops: u64,
    /// log2 capacity hint (`--initial-capacity`)
    pub initial_capacity: u32,
    /// Percentage of capacity filled before timing (`--prefill`)
    pub prefill_percent: u32,
    /// Read share of the timed phase (`--reads`)
    pub read_percent: u32,
    /// Insert share of the timed phase (`--inserts`)
    pub insert_percent: u32,
    /// Upsert share of the timed phase (`--upserts`)
    pub upsert_percent: u32,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            total_ops: 100,
            initial_capacity: 23,
            prefill_percent: 25,
            read_percent: 0,
            insert_percent: 0,
            upsert_percent: 0,
        }
    }
}

impl WorkloadParams {
    /// Every timed operation is a read.
    pub fn all_reads() -> Self {
        Self {
            read_percent: 100,
            ..Default::default()
        }
    }

    /// Every timed operation is an insert.
    pub fn all_inserts() -> Self {
        Self {
            insert_percent: 100,
            ..Default::default()
        }
    }

    /// Every timed operation is an upsert.
    pub fn all_upserts() -> Self {
        Self {
            upsert_percent: 100,
            ..Default::default()
        }
    }

    /// Read/insert mix such as 90/10.
    pub fn mixed(read_percent: u32, insert_percent: u32) -> Self {
        Self {
            read_percent,
            insert_percent,
            ..Default::default()
        }
    }

    pub fn with_total_ops(mut self, total_ops: u64) -> Self {
        self.total_ops = total_ops;
        self
    }

    pub fn with_initial_capacity(mut self, initial_capacity: u32) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_prefill(mut self, prefill_percent: u32) -> Self {
        self.prefill_percent = prefill_percent;
        self
    }

    /// Workload-mix identity of these parameters.
    pub fn identity(&self) -> WorkloadIdentity {
        WorkloadIdentity::Mix {
            reads: self.read_percent,
            inserts: self.insert_percent,
            upserts: self.upsert_percent,
        }
    }
}

/// What a trial asks the external binary to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Workload {
    /// Flag-driven operation mix
    Mix(WorkloadParams),
    /// k-mer counting over a FASTA input
    Sequence { input_file: PathBuf },
}

impl Workload {
    pub fn identity(&self) -> WorkloadIdentity {
        match self {
            Workload::Mix(params) => params.identity(),
            Workload::Sequence { input_file } => {
                WorkloadIdentity::Input(input_file.display().to_string())
            }
        }
    }

    /// Declared total operation count, when the workload has one.
    pub fn total_ops(&self) -> Option<u64> {
        match self {
            Workload::Mix(params) => Some(params.total_ops),
            Workload::Sequence { .. } => None,
        }
    }
}

/// Grouping key for results: the operation mix, or the input file for
/// sequence-analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkloadIdentity {
    Mix { reads: u32, inserts: u32, upserts: u32 },
    Input(String),
}

impl WorkloadIdentity {
    /// Composite string key, e.g. `100-0-0`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadIdentity::Mix {
                reads,
                inserts,
                upserts,
            } => write!(f, "{}-{}-{}", reads, inserts, upserts),
            WorkloadIdentity::Input(path) => f.write_str(path),
        }
    }
}

/// One benchmark invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    table: String,
    thread_count: u32,
    workload: Workload,
}

impl Trial {
    pub fn new(table: impl Into<String>, thread_count: u32, workload: Workload) -> Self {
        Self {
            table: table.into(),
            thread_count,
            workload,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn thread_count(&self) -> u32 {
        self.thread_count
    }

    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// Arguments handed to the external binary, in its documented order.
    pub fn args(&self) -> Vec<String> {
        match &self.workload {
            Workload::Mix(p) => vec![
                "--reads".to_string(),
                p.read_percent.to_string(),
                "--inserts".to_string(),
                p.insert_percent.to_string(),
                "--upserts".to_string(),
                p.upsert_percent.to_string(),
                "--initial-capacity".to_string(),
                p.initial_capacity.to_string(),
                "--prefill".to_string(),
                p.prefill_percent.to_string(),
                "--total-ops".to_string(),
                p.total_ops.to_string(),
                "--num-threads".to_string(),
                self.thread_count.to_string(),
            ],
            Workload::Sequence { input_file } => vec![
                self.thread_count.to_string(),
                input_file.display().to_string(),
            ],
        }
    }

    /// Output file name encoding table, threads and mix.
    pub fn output_name(&self) -> String {
        match &self.workload {
            Workload::Mix(p) => format!(
                "{}_{}_threads_{}_{}_{}",
                self.table, self.thread_count, p.read_percent, p.insert_percent, p.upsert_percent
            ),
            Workload::Sequence { .. } => format!("{}_{}_threads.txt", self.table, self.thread_count),
        }
    }
}
