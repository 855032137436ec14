//! Sweep driver and result analyser for external hash-table benchmarks.
//!
//! Generates parameter sweeps, runs the benchmark executables one trial
//! at a time, and turns their captured output into grouped results.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod literal;
pub mod manifest;
pub mod presets;
pub mod record;
pub mod report;
pub mod runner;
pub mod sweep;
pub mod workload;

pub use aggregate::{aggregate, Measurement, ResultSet};
pub use config::HarnessConfig;
pub use error::{HarnessError, RecordError};
pub use record::{ParseReport, RecordParser, ResultRecord};
pub use runner::{SweepSummary, TrialRunner};
pub use sweep::{SweepContext, SweepPlan, ThreadSchedule};
pub use workload::{Trial, Workload, WorkloadIdentity, WorkloadParams};
