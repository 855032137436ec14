//! Shared fixtures: stand-in benchmark executables and canned outputs.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use htbench_core::HarnessConfig;

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serializes script creation and process spawning across tests.
///
/// A script still open for writing in one test while another test forks
/// makes exec fail with ETXTBSY.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Config rooted in `root` for every directory the harness touches.
pub fn config_in(root: &Path) -> HarnessConfig {
    HarnessConfig {
        results_root: root.join("results"),
        sequence_results_root: root.join("fasta_results"),
        graphs_root: root.join("graphs"),
        builds_root: root.join("builds"),
        sequence_builds_root: root.join("fasta_builds"),
        ..Default::default()
    }
}

/// Workload-flag benchmark record as the binaries print it.
pub fn workload_record(table: &str, args: &str, throughput: f64, elapsed: f64) -> String {
    format!(
        r#"{{
    "args": "{}",
    "key": "uint64_t",
    "value": "uint64_t",
    "table": "{}",
    "output": {{
        "total_ops": {{"name": "Total Operations", "units": "count", "value": 100}},
        "time_elapsed": {{"name": "Time Elapsed", "units": "seconds", "value": {}}},
        "throughput": {{"name": "Throughput", "units": "count/seconds", "value": {}}}
    }}
}}
"#,
        args, table, elapsed, throughput
    )
}

/// Installs an executable shell script at `path`.
#[cfg(unix)]
pub fn install_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    let mut permissions = fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).unwrap();
}

/// Stand-in universal benchmark for `table`: echoes its arguments in a
/// record whose throughput is 1000 per thread.
#[cfg(unix)]
pub fn install_fake_benchmark(config: &HarnessConfig, table: &str) {
    let body = r#"threads=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "--num-threads" ]; then threads="$arg"; fi
    prev="$arg"
done
cat <<RECORD
{
    "args": "$*",
    "table": "__TABLE__",
    "output": {
        "total_ops": {"value": 100},
        "time_elapsed": {"value": 0.5},
        "throughput": {"value": $((threads * 1000))}
    }
}
RECORD
"#
    .replace("__TABLE__", table);
    install_script(
        &config.builds_root.join(table).join(&config.universal_binary),
        &body,
    );
}

/// Stand-in benchmark that always reports failure.
#[cfg(unix)]
pub fn install_failing_benchmark(config: &HarnessConfig, table: &str) {
    install_script(
        &config.builds_root.join(table).join(&config.universal_binary),
        "echo \"FATAL: $0 cannot run this mix\"\nexit 1\n",
    );
}

/// Stand-in sequence-analysis benchmark: chatter, then a record with
/// trailing commas.
#[cfg(unix)]
pub fn install_fake_sequence_benchmark(config: &HarnessConfig, table: &str) {
    let body = r#"echo "Preloading file: $2"
echo "Loaded 42 entries."
cat <<RECORD
{
    "args": "$0 $*",
    "threads": "$1",
    "table": "__TABLE__",
    "input_file": "$2",
    "output": {
        "time_elapsed": {"name": "Time Elapsed", "units": "seconds", "value": 1.0},
        "throughput": {"name": "Throughput", "units": "10^6 mers/second", "value": $(( $1 * 2 ))},
    }
}
RECORD
"#
    .replace("__TABLE__", table);
    install_script(
        &config
            .sequence_builds_root
            .join(table)
            .join(&config.sequence_binary),
        &body,
    );
}
