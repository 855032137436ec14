//! Grouping of result records by workload mix, table and thread count.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::manifest::SweepManifest;
use crate::record::{ParseReport, ResultRecord};

/// Measured values at one thread count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub throughput: f64,
    pub runtime: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ops: Option<u64>,
}

impl From<&ResultRecord> for Measurement {
    fn from(record: &ResultRecord) -> Self {
        Self {
            throughput: record.throughput,
            runtime: record.elapsed_seconds,
            total_ops: record.total_ops,
        }
    }
}

/// Table name to its measurements, ordered by numeric thread count.
pub type TableSeries = BTreeMap<String, BTreeMap<u32, Measurement>>;

/// Workload-mix key -> table -> thread count -> measurement.
///
/// Every level is ordered, so tables enumerate in the same order on every
/// run and thread counts enumerate numerically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    mixes: BTreeMap<String, TableSeries>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record. Returns the measurement it replaced, if any.
    pub fn insert(&mut self, record: &ResultRecord) -> Option<Measurement> {
        self.mixes
            .entry(record.identity.key())
            .or_default()
            .entry(record.table.clone())
            .or_default()
            .insert(record.thread_count, Measurement::from(record))
    }

    /// Builds a set from records, replacing duplicates silently.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ResultRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.mixes.is_empty()
    }

    /// Number of stored measurements.
    pub fn len(&self) -> usize {
        self.mixes
            .values()
            .flat_map(|tables| tables.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn mix_keys(&self) -> impl Iterator<Item = &str> {
        self.mixes.keys().map(String::as_str)
    }

    pub fn mix(&self, key: &str) -> Option<&TableSeries> {
        self.mixes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableSeries)> {
        self.mixes.iter().map(|(key, tables)| (key.as_str(), tables))
    }

    /// Every table across all mixes, sorted by name.
    pub fn tables(&self) -> Vec<&str> {
        let tables: BTreeSet<&str> = self
            .mixes
            .values()
            .flat_map(|tables| tables.keys())
            .map(String::as_str)
            .collect();
        tables.into_iter().collect()
    }

    /// Thread counts measured for `table` under `mix`, ascending.
    pub fn thread_counts(&self, mix: &str, table: &str) -> Vec<u32> {
        self.mixes
            .get(mix)
            .and_then(|tables| tables.get(table))
            .map(|points| points.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, mix: &str, table: &str, threads: u32) -> Option<&Measurement> {
        self.mixes.get(mix)?.get(table)?.get(&threads)
    }
}

/// Builds the result set of a parsed sweep.
///
/// When the sweep's manifest is available each record is checked against
/// the trial that produced it; disagreements and duplicate measurements
/// are logged and the later record wins.
pub fn aggregate(report: &ParseReport, manifest: Option<&SweepManifest>) -> ResultSet {
    let mut set = ResultSet::new();
    for parsed in &report.records {
        let record = &parsed.record;

        if let Some(trial) = manifest.and_then(|m| m.trial_for(&parsed.file_name)) {
            if trial.thread_count() != record.thread_count {
                tracing::warn!(
                    "{}: requested {} threads, record reports {}",
                    parsed.file_name,
                    trial.thread_count(),
                    record.thread_count
                );
            }
            if trial.workload().identity() != record.identity {
                tracing::warn!(
                    "{}: requested workload {}, record reports {}",
                    parsed.file_name,
                    trial.workload().identity(),
                    record.identity
                );
            }
            if let (Some(requested), Some(reported)) = (trial.workload().total_ops(), record.total_ops)
            {
                if requested != reported {
                    tracing::debug!(
                        "{}: requested {} total ops, record reports {}",
                        parsed.file_name,
                        requested,
                        reported
                    );
                }
            }
        }

        if set.insert(record).is_some() {
            tracing::warn!(
                "{}: replaced earlier measurement for {} / {} / {} threads",
                parsed.file_name,
                record.identity,
                record.table,
                record.thread_count
            );
        }
    }
    set
}
