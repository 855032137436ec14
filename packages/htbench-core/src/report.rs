//! Textual summary and plot-ready files for a result set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::ResultSet;
use crate::error::HarnessError;

/// File receiving the serialized result set.
pub const RESULTS_FILE: &str = "results.json";
/// File receiving the table colour assignment.
pub const LEGEND_FILE: &str = "legend.csv";

/// Fixed colours for the tables the harness has always plotted.
const KNOWN_COLORS: &[(&str, &str)] = &[
    ("folklore", "blue"),
    ("hopscotch", "pink"),
    ("libcuckoo", "red"),
    ("ndhash", "green"),
    ("dhash", "lightgreen"),
];

/// Colours for any other table, by sorted position.
const FALLBACK_COLORS: &[&str] = &[
    "orange", "purple", "brown", "gray", "olive", "cyan", "black", "gold",
];

/// Table-to-colour assignment, in table name order.
///
/// Depends only on the set of table names, so repeated analyses of
/// similar sweeps draw each table the same way.
pub fn legend(set: &ResultSet) -> Vec<(String, &'static str)> {
    set.tables()
        .into_iter()
        .enumerate()
        .map(|(position, table)| (table.to_string(), color_for(table, position)))
        .collect()
}

fn color_for(table: &str, position: usize) -> &'static str {
    let lower = table.to_ascii_lowercase();
    KNOWN_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLORS[position % FALLBACK_COLORS.len()])
}

/// Throughput tables, one per workload mix: a row per thread count, a
/// column per table.
pub fn render_summary(set: &ResultSet) -> String {
    if set.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = String::new();
    for (mix, tables) in set.iter() {
        let names: Vec<&String> = tables.keys().collect();

        out.push_str(&format!("Workload {}\n", mix));
        out.push_str(&format!("{:>8}", "threads"));
        for name in &names {
            out.push_str(&format!(" {:>14}", name));
        }
        out.push('\n');

        for t in thread_axis(set, mix) {
            out.push_str(&format!("{:>8}", t));
            for name in &names {
                let cell = match set.get(mix, name, t) {
                    Some(m) => format!(" {:>14.2}", m.throughput),
                    None => format!(" {:>14}", "-"),
                };
                out.push_str(&cell);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Union of thread counts measured under `mix`, ascending.
fn thread_axis(set: &ResultSet, mix: &str) -> Vec<u32> {
    let mut threads: Vec<u32> = set
        .mix(mix)
        .map(|tables| {
            tables
                .values()
                .flat_map(|points| points.keys().copied())
                .collect()
        })
        .unwrap_or_default();
    threads.sort_unstable();
    threads.dedup();
    threads
}

/// File name for a mix's series; path separators and other odd characters
/// in input-file keys become `_`.
pub fn series_file_name(mix: &str) -> String {
    let stem: String = mix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.csv", stem.trim_start_matches('.'))
}

/// Series file name for every mix, in mix order.
///
/// Distinct keys that sanitize to the same name get `_2`, `_3`, ...
/// before the extension, so no series overwrites another or the legend.
pub fn series_file_names(set: &ResultSet) -> Vec<(String, String)> {
    let mut taken: HashSet<String> = HashSet::from([LEGEND_FILE.to_string()]);
    set.mix_keys()
        .map(|mix| {
            let base = series_file_name(mix);
            let mut name = base.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{}_{}.csv", base.trim_end_matches(".csv"), n);
            }
            (mix.to_string(), name)
        })
        .collect()
}

/// Graph directory for a sweep: `<graphs_root>/<sweep dir name>`.
pub fn graph_dir_for(graphs_root: &Path, sweep_dir: &Path) -> PathBuf {
    match sweep_dir.file_name() {
        Some(name) => graphs_root.join(name),
        None => graphs_root.to_path_buf(),
    }
}

/// Writes `results.json`, `legend.csv` and one series CSV per mix into `dir`.
///
/// # Arguments
/// * `set` - Aggregated results
/// * `dir` - Graph directory, created if missing
///
/// # Returns
/// `Result<Vec<PathBuf>, HarnessError>` listing the files written.
pub fn write_report(set: &ResultSet, dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    fs::create_dir_all(dir).map_err(|e| {
        HarnessError::Filesystem(format!(
            "Failed to create graph directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut written = Vec::new();

    let results_path = dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(set)
        .map_err(|e| HarnessError::Serialization(e.to_string()))?;
    fs::write(&results_path, json).map_err(|e| {
        HarnessError::Io(format!("Failed to write {}: {}", results_path.display(), e))
    })?;
    written.push(results_path);

    let legend_path = dir.join(LEGEND_FILE);
    let mut writer = csv_writer(&legend_path)?;
    write_row(&mut writer, &legend_path, ["table", "color"])?;
    for (table, color) in legend(set) {
        write_row(&mut writer, &legend_path, [table.as_str(), color])?;
    }
    flush(writer, &legend_path)?;
    written.push(legend_path);

    for (mix, file_name) in series_file_names(set) {
        let Some(tables) = set.mix(&mix) else {
            continue;
        };
        let mix = mix.as_str();
        let path = dir.join(file_name);
        let mut writer = csv_writer(&path)?;

        let mut header = vec!["threads".to_string()];
        header.extend(tables.keys().cloned());
        write_row(&mut writer, &path, &header)?;

        for t in thread_axis(set, mix) {
            let mut row = vec![t.to_string()];
            for table in tables.keys() {
                row.push(
                    set.get(mix, table, t)
                        .map(|m| m.throughput.to_string())
                        .unwrap_or_default(),
                );
            }
            write_row(&mut writer, &path, &row)?;
        }
        flush(writer, &path)?;
        written.push(path);
    }

    tracing::info!("Wrote {} report files to {}", written.len(), dir.display());
    Ok(written)
}

fn csv_writer(path: &Path) -> Result<csv::Writer<fs::File>, HarnessError> {
    csv::Writer::from_path(path)
        .map_err(|e| HarnessError::Io(format!("Failed to create {}: {}", path.display(), e)))
}

fn write_row<I, T>(writer: &mut csv::Writer<fs::File>, path: &Path, row: I) -> Result<(), HarnessError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| HarnessError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

fn flush(mut writer: csv::Writer<fs::File>, path: &Path) -> Result<(), HarnessError> {
    writer
        .flush()
        .map_err(|e| HarnessError::Io(format!("Failed to flush {}: {}", path.display(), e)))
}
