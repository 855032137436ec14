//! Parsing, aggregation and report output over prepared sweep directories.

use std::fs;
use std::path::Path;

use htbench_core::report::{graph_dir_for, render_summary, write_report, LEGEND_FILE, RESULTS_FILE};
use htbench_core::sweep::latest_sweep_dir;
use htbench_core::{aggregate, RecordError, RecordParser};
use ntest::timeout;
use tempfile::tempdir;

use crate::helpers::workload_record;

fn args(reads: u32, inserts: u32, threads: u32) -> String {
    format!(
        "--reads {} --inserts {} --upserts 0 --initial-capacity 23 --prefill 25 --total-ops 100 --num-threads {}",
        reads, inserts, threads
    )
}

fn write_result(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[timeout(5000)]
#[test]
fn test_malformed_files_are_skipped() {
    let temp_dir = tempdir().unwrap();
    let dir = temp_dir.path();

    for threads in [1, 2, 4, 8, 16, 32, 64] {
        write_result(
            dir,
            &format!("folklore_{}_threads_100_0_0", threads),
            &workload_record("folklore", &args(100, 0, threads), threads as f64 * 10.0, 1.0),
        );
    }
    write_result(dir, "ndhash_1_threads_100_0_0", "{'table': 'ndhash', 'args': ");
    write_result(dir, "ndhash_2_threads_100_0_0", "Segmentation fault\n");
    write_result(
        dir,
        "ndhash_4_threads_100_0_0",
        &workload_record("ndhash", "--reads 100 --inserts", 1.0, 1.0),
    );

    let report = RecordParser::default().parse_dir(dir).unwrap();
    assert_eq!(report.total(), 10);
    assert_eq!(report.records.len(), 7);
    assert_eq!(report.skipped.len(), 3);
    assert_eq!(report.external_failures(), 0);

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(
        skipped,
        vec![
            "ndhash_1_threads_100_0_0",
            "ndhash_2_threads_100_0_0",
            "ndhash_4_threads_100_0_0"
        ]
    );
    assert!(matches!(report.skipped[0].error, RecordError::Syntax { .. }));
    assert!(matches!(
        report.skipped[2].error,
        RecordError::InvalidField { .. }
    ));

    let set = aggregate(&report, None);
    assert_eq!(set.tables(), vec!["folklore"]);
    assert_eq!(
        set.thread_counts("100-0-0", "folklore"),
        vec![1, 2, 4, 8, 16, 32, 64]
    );
}

#[timeout(5000)]
#[test]
fn test_failure_marker_yields_no_record() {
    let temp_dir = tempdir().unwrap();
    write_result(
        temp_dir.path(),
        "hopscotch_4_threads_0_0_100",
        "FATAL: upserts not supported\n",
    );

    let report = RecordParser::default().parse_dir(temp_dir.path()).unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.external_failures(), 1);
    assert_eq!(
        report.skipped[0].error,
        RecordError::ExternalFailure("FATAL: upserts not supported".to_string())
    );
    assert!(aggregate(&report, None).is_empty());
}

#[timeout(5000)]
#[test]
fn test_latest_sweep_is_analysed_and_reported() {
    let temp_dir = tempdir().unwrap();
    let results = temp_dir.path().join("results");
    let older = results.join("2024-03-01_09:00:00");
    let newer = results.join("2024-03-02_09:00:00");
    fs::create_dir_all(&older).unwrap();
    fs::create_dir_all(&newer).unwrap();
    fs::create_dir_all(results.join("test4")).unwrap();

    write_result(
        &older,
        "folklore_1_threads_100_0_0",
        &workload_record("folklore", &args(100, 0, 1), 1.0, 1.0),
    );
    for (table, threads, throughput) in [
        ("libcuckoo", 16, 160.0),
        ("libcuckoo", 2, 20.0),
        ("folklore", 2, 25.0),
        ("folklore", 16, 170.0),
    ] {
        write_result(
            &newer,
            &format!("{}_{}_threads_50_50_0", table, threads),
            &workload_record(table, &args(50, 50, threads), throughput, 0.25),
        );
    }

    let sweep = latest_sweep_dir(&results).unwrap().unwrap();
    assert_eq!(sweep, newer);

    let report = RecordParser::default().parse_dir(&sweep).unwrap();
    let set = aggregate(&report, None);
    assert_eq!(set.mix_keys().collect::<Vec<_>>(), vec!["50-50-0"]);

    let summary = render_summary(&set);
    assert!(summary.starts_with("Workload 50-50-0\n"));
    assert!(summary.contains("folklore"));

    let graphs = graph_dir_for(&temp_dir.path().join("graphs"), &sweep);
    let written = write_report(&set, &graphs).unwrap();
    assert_eq!(written.len(), 3);
    assert!(graphs.ends_with("2024-03-02_09:00:00"));

    let series = fs::read_to_string(graphs.join("50-50-0.csv")).unwrap();
    assert_eq!(series, "threads,folklore,libcuckoo\n2,25,20\n16,170,160\n");
    let legend = fs::read_to_string(graphs.join(LEGEND_FILE)).unwrap();
    assert_eq!(legend, "table,color\nfolklore,blue\nlibcuckoo,red\n");
    assert!(graphs.join(RESULTS_FILE).exists());
}
