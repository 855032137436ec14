//! Sweep execution against stand-in benchmark executables.

#![cfg(unix)]

use std::fs;

use chrono::{TimeZone, Utc};
use htbench_core::manifest::{SweepManifest, MANIFEST_FILE};
use htbench_core::runner::TrialStatus;
use htbench_core::{
    aggregate, RecordParser, SweepContext, SweepPlan, ThreadSchedule, TrialRunner, Workload,
    WorkloadParams,
};
use ntest::timeout;
use tempfile::tempdir;

use crate::helpers::{
    config_in, install_failing_benchmark, install_fake_benchmark, install_fake_sequence_benchmark,
    process_lock,
};

fn read_plan(tables: &[&str], threads: Vec<u32>) -> SweepPlan {
    SweepPlan {
        name: "scaling".to_string(),
        tables: tables.iter().map(|t| t.to_string()).collect(),
        threads: ThreadSchedule::Fixed(threads),
        workloads: vec![Workload::Mix(WorkloadParams::all_reads())],
        output_root: "unused".into(),
    }
}

#[timeout(20000)]
#[test]
fn test_sweep_writes_one_file_per_trial() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());
    let _guard = process_lock();
    install_fake_benchmark(&config, "folklore");
    install_fake_benchmark(&config, "libcuckoo");

    let trials = read_plan(&["folklore", "libcuckoo"], vec![1, 4, 8])
        .generate(16)
        .unwrap();
    let context = SweepContext::create(&config.results_root).unwrap();
    let runner = TrialRunner::new(config.clone());

    let summary = runner.run_sweep(&context, "scaling", &trials, 16).unwrap();
    assert_eq!(summary.launched(), 6);
    assert_eq!(summary.spawn_failures(), 0);
    assert_eq!(summary.abnormal_exits(), 0);

    let mut names: Vec<String> = fs::read_dir(context.sweep_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != MANIFEST_FILE)
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "folklore_1_threads_100_0_0",
            "folklore_4_threads_100_0_0",
            "folklore_8_threads_100_0_0",
            "libcuckoo_1_threads_100_0_0",
            "libcuckoo_4_threads_100_0_0",
            "libcuckoo_8_threads_100_0_0",
        ]
    );

    let manifest = SweepManifest::load(context.sweep_dir()).unwrap().unwrap();
    assert_eq!(manifest.entries.len(), 6);
    assert_eq!(
        manifest
            .trial_for("libcuckoo_4_threads_100_0_0")
            .unwrap()
            .thread_count(),
        4
    );

    let report = RecordParser::new(&config)
        .parse_dir(context.sweep_dir())
        .unwrap();
    assert_eq!(report.records.len(), 6);
    assert!(report.skipped.is_empty());

    let set = aggregate(&report, Some(&manifest));
    assert_eq!(set.mix_keys().collect::<Vec<_>>(), vec!["100-0-0"]);
    assert_eq!(set.tables(), vec!["folklore", "libcuckoo"]);
    assert_eq!(set.thread_counts("100-0-0", "folklore"), vec![1, 4, 8]);
    assert_eq!(set.thread_counts("100-0-0", "libcuckoo"), vec![1, 4, 8]);
    assert_eq!(set.get("100-0-0", "libcuckoo", 8).unwrap().throughput, 8000.0);
    assert_eq!(set.get("100-0-0", "folklore", 1).unwrap().total_ops, Some(100));
}

#[timeout(20000)]
#[test]
fn test_failed_and_missing_binaries_do_not_stop_sweep() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());
    let _guard = process_lock();
    install_fake_benchmark(&config, "folklore");
    install_failing_benchmark(&config, "broken");

    let trials = read_plan(&["broken", "folklore", "absent"], vec![2])
        .generate(4)
        .unwrap();
    let context = SweepContext::create(&config.results_root).unwrap();
    let summary = TrialRunner::new(config.clone())
        .run_sweep(&context, "scaling", &trials, 4)
        .unwrap();

    assert_eq!(summary.launched(), 3);
    assert_eq!(summary.spawn_failures(), 1);
    assert_eq!(summary.abnormal_exits(), 1);
    assert!(matches!(
        summary.outcomes[2].status,
        TrialStatus::SpawnFailed(_)
    ));
    assert!(context.output_path("absent_2_threads_100_0_0").exists());

    let report = RecordParser::new(&config)
        .parse_dir(context.sweep_dir())
        .unwrap();
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].record.table, "folklore");
    assert_eq!(report.external_failures(), 1);
    assert_eq!(report.parse_failures(), 1);
}

#[timeout(20000)]
#[test]
fn test_sequence_sweep() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());
    let _guard = process_lock();
    install_fake_sequence_benchmark(&config, "ndhash");

    let plan = SweepPlan {
        name: "sequence".to_string(),
        tables: vec!["ndhash".to_string()],
        threads: ThreadSchedule::Fixed(vec![1, 3]),
        workloads: vec![Workload::Sequence {
            input_file: "chr22.fa".into(),
        }],
        output_root: config.sequence_results_root.clone(),
    };
    let trials = plan.generate(4).unwrap();
    let context = SweepContext::create(&plan.output_root).unwrap();
    TrialRunner::new(config.clone())
        .run_sweep(&context, &plan.name, &trials, 4)
        .unwrap();

    assert!(context.output_path("ndhash_3_threads.txt").exists());

    let report = RecordParser::new(&config)
        .parse_dir(context.sweep_dir())
        .unwrap();
    assert_eq!(report.records.len(), 2);

    let set = aggregate(&report, SweepManifest::load(context.sweep_dir()).unwrap().as_ref());
    assert_eq!(set.mix_keys().collect::<Vec<_>>(), vec!["chr22.fa"]);
    assert_eq!(set.thread_counts("chr22.fa", "ndhash"), vec![1, 3]);
    assert_eq!(set.get("chr22.fa", "ndhash", 3).unwrap().throughput, 6.0);
}

#[test]
fn test_sweep_directory_collision_is_fatal() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("results");
    let started = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let first = SweepContext::create_at(&root, started).unwrap();
    assert!(first.sweep_dir().ends_with("2024-05-01_12:00:00"));
    assert!(SweepContext::create_at(&root, started).is_err());
}
