//! Decoding of captured benchmark output into result records.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::HarnessConfig;
use crate::error::{classify_io_error, HarnessError, RecordError};
use crate::literal::parse_literal;
use crate::manifest::MANIFEST_FILE;
use crate::workload::WorkloadIdentity;

/// Decoded outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Table name as reported by the binary
    pub table: String,
    /// Argument string echoed by the binary
    pub args_echo: String,
    /// Worker threads used
    pub thread_count: u32,
    /// Total operations, when reported or echoed
    pub total_ops: Option<u64>,
    /// Measured throughput
    pub throughput: f64,
    /// Unit label of `throughput`, when given
    pub throughput_units: Option<String>,
    /// Duration of the timed phase in seconds
    pub elapsed_seconds: f64,
    /// Mix or input file the run belongs to
    pub identity: WorkloadIdentity,
    /// Flag/value pairs tokenized from `args_echo` (workload-flag runs only)
    pub flags: BTreeMap<String, String>,
}

/// Decodes result files using the configured failure marker and flag prefix.
#[derive(Debug, Clone)]
pub struct RecordParser {
    failure_marker: String,
    flag_prefix_len: usize,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(&HarnessConfig::default())
    }
}

impl RecordParser {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            failure_marker: config.failure_marker.clone(),
            flag_prefix_len: config.flag_prefix_len,
        }
    }

    /// Decodes the full captured output of one trial.
    ///
    /// Progress lines printed ahead of the record are skipped; the record
    /// starts at the first line opening with `{`.
    pub fn decode(&self, content: &str) -> Result<ResultRecord, RecordError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with(&self.failure_marker) {
            let first_line = trimmed.lines().next().unwrap_or_default();
            return Err(RecordError::ExternalFailure(first_line.trim_end().to_string()));
        }
        if trimmed.is_empty() {
            return Err(RecordError::Syntax {
                line: 1,
                column: 1,
                message: "empty output".to_string(),
            });
        }

        let (skipped_lines, literal) = locate_record(content).ok_or_else(|| RecordError::Syntax {
            line: 1,
            column: 1,
            message: "no record literal in output".to_string(),
        })?;

        let value = parse_literal(literal).map_err(|e| match e {
            RecordError::Syntax {
                line,
                column,
                message,
            } => RecordError::Syntax {
                line: line + skipped_lines,
                column,
                message,
            },
            other => other,
        })?;

        self.decode_value(&value)
    }

    /// Reads and decodes one result file.
    pub fn parse_file(&self, path: &Path) -> Result<ResultRecord, RecordError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecordError::Io(format!("{}: {}", path.display(), e)))?;
        self.decode(&content)
    }

    /// Parses every result file of a sweep directory.
    ///
    /// Files are visited in name order. Failed files are logged and
    /// collected in the report; they never stop the batch.
    ///
    /// # Arguments
    /// * `dir` - Sweep directory holding one file per trial
    ///
    /// # Returns
    /// `Result<ParseReport, HarnessError>`; only an unreadable directory is an error.
    pub fn parse_dir(&self, dir: &Path) -> Result<ParseReport, HarnessError> {
        let mut report = ParseReport::default();
        for path in result_files(dir)? {
            let file_name = file_name_of(&path);
            match self.parse_file(&path) {
                Ok(record) => report.records.push(ParsedResult { file_name, record }),
                Err(error) => {
                    tracing::warn!("Failed to parse {}: {}", file_name, error);
                    report.skipped.push(SkippedResult { file_name, error });
                }
            }
        }
        tracing::info!(
            "Parsed {} result files in {}: {} records, {} skipped",
            report.total(),
            dir.display(),
            report.records.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn decode_value(&self, value: &Value) -> Result<ResultRecord, RecordError> {
        let root = value
            .as_object()
            .ok_or_else(|| RecordError::invalid("record", "not a mapping"))?;

        let table = required_str(root, "table")?.to_string();
        let output = root
            .get("output")
            .ok_or_else(|| RecordError::MissingField("output".into()))?
            .as_object()
            .ok_or_else(|| RecordError::invalid("output", "not a mapping"))?;

        let (throughput, throughput_units) = measurement(output, "output.throughput", "throughput")?
            .ok_or_else(|| RecordError::MissingField("output.throughput".into()))?;
        let (elapsed_seconds, _) = measurement(output, "output.time_elapsed", "time_elapsed")?
            .ok_or_else(|| RecordError::MissingField("output.time_elapsed".into()))?;
        let reported_ops = measurement(output, "output.total_ops", "total_ops")?
            .map(|(ops, _)| whole_number("output.total_ops", ops))
            .transpose()?;

        if let Some(input_file) = root.get("input_file") {
            let input_file = input_file
                .as_str()
                .ok_or_else(|| RecordError::invalid("input_file", input_file))?;
            let threads = root
                .get("threads")
                .ok_or_else(|| RecordError::MissingField("threads".into()))?;
            let args_echo = match root.get("args") {
                Some(args) => args
                    .as_str()
                    .ok_or_else(|| RecordError::invalid("args", args))?
                    .to_string(),
                None => String::new(),
            };

            return Ok(ResultRecord {
                table,
                args_echo,
                thread_count: thread_count("threads", threads)?,
                total_ops: reported_ops,
                throughput,
                throughput_units,
                elapsed_seconds,
                identity: WorkloadIdentity::Input(input_file.to_string()),
                flags: BTreeMap::new(),
            });
        }

        let args_echo = required_str(root, "args")?.to_string();
        let flags = tokenize_args(&args_echo, self.flag_prefix_len)?;

        let identity = WorkloadIdentity::Mix {
            reads: percent(&flags, "reads")?,
            inserts: percent(&flags, "inserts")?,
            upserts: percent(&flags, "upserts")?,
        };
        let threads = flags
            .get("num-threads")
            .ok_or_else(|| RecordError::MissingField("args.num-threads".into()))?;
        let thread_count = thread_count("args.num-threads", &Value::String(threads.clone()))?;
        let total_ops = match reported_ops {
            Some(ops) => Some(ops),
            None => flags
                .get("total-ops")
                .map(|ops| {
                    ops.parse::<u64>()
                        .map_err(|_| RecordError::invalid("args.total-ops", ops))
                })
                .transpose()?,
        };

        Ok(ResultRecord {
            table,
            args_echo,
            thread_count,
            total_ops,
            throughput,
            throughput_units,
            elapsed_seconds,
            identity,
            flags,
        })
    }
}

/// Splits an echoed argument string into flag/value pairs.
///
/// Tokens alternate flag, value. Each flag loses its `prefix_len` leading
/// dashes. Flags and values cannot contain whitespace.
pub fn tokenize_args(args: &str, prefix_len: usize) -> Result<BTreeMap<String, String>, RecordError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(RecordError::invalid("args", format!("odd token count in '{}'", args)));
    }

    let mut flags = BTreeMap::new();
    for pair in tokens.chunks(2) {
        let (flag, value) = (pair[0], pair[1]);
        let has_prefix = flag.len() > prefix_len && flag.bytes().take(prefix_len).all(|b| b == b'-');
        if !has_prefix {
            return Err(RecordError::invalid("args", format!("'{}' is not a flag", flag)));
        }
        let name = &flag[prefix_len..];
        if flags.insert(name.to_string(), value.to_string()).is_some() {
            return Err(RecordError::invalid("args", format!("flag '{}' repeated", flag)));
        }
    }
    Ok(flags)
}

/// One successfully decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResult {
    pub file_name: String,
    pub record: ResultRecord,
}

/// One file that produced no record, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedResult {
    pub file_name: String,
    pub error: RecordError,
}

/// Outcome of parsing a sweep directory.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub records: Vec<ParsedResult>,
    pub skipped: Vec<SkippedResult>,
}

impl ParseReport {
    /// Number of files visited.
    pub fn total(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    /// Files whose binary reported the failure marker.
    pub fn external_failures(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| s.error.is_external_failure())
            .count()
    }

    /// Files that did not decode.
    pub fn parse_failures(&self) -> usize {
        self.skipped.len() - self.external_failures()
    }
}

fn result_files(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| classify_io_error(e, &format!("Failed to list {}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| classify_io_error(e, "Failed to read directory entry"))?;
        let path = entry.path();
        if path.is_file() && entry.file_name() != MANIFEST_FILE {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Returns the number of lines skipped and the text from the record's opening line on.
fn locate_record(content: &str) -> Option<(usize, &str)> {
    let mut offset = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        if line.trim_start().starts_with('{') {
            return Some((index, &content[offset..]));
        }
        offset += line.len();
    }
    None
}

fn required_str<'v>(map: &'v Map<String, Value>, key: &str) -> Result<&'v str, RecordError> {
    let value = map
        .get(key)
        .ok_or_else(|| RecordError::MissingField(key.to_string()))?;
    value.as_str().ok_or_else(|| RecordError::invalid(key, value))
}

/// A number, or a mapping carrying a numeric `value` and optional `units`.
fn measurement(
    output: &Map<String, Value>,
    field: &str,
    key: &str,
) -> Result<Option<(f64, Option<String>)>, RecordError> {
    let Some(raw) = output.get(key) else {
        return Ok(None);
    };
    match raw {
        Value::Object(inner) => {
            let value = inner
                .get("value")
                .ok_or_else(|| RecordError::MissingField(format!("{}.value", field)))?;
            let units = inner.get("units").and_then(Value::as_str).map(str::to_string);
            Ok(Some((number(field, value)?, units)))
        }
        other => Ok(Some((number(field, other)?, None))),
    }
}

fn number(field: &str, value: &Value) -> Result<f64, RecordError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| RecordError::invalid(field, n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RecordError::invalid(field, s)),
        other => Err(RecordError::invalid(field, other)),
    }
}

fn whole_number(field: &str, value: f64) -> Result<u64, RecordError> {
    if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Ok(value as u64)
    } else {
        Err(RecordError::invalid(field, value))
    }
}

/// Thread counts are positive integers, given as numbers or numerals.
fn thread_count(field: &str, value: &Value) -> Result<u32, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n > 0 => Ok(n),
        _ => Err(RecordError::invalid(field, value)),
    }
}

fn percent(flags: &BTreeMap<String, String>, name: &str) -> Result<u32, RecordError> {
    let field = format!("args.{}", name);
    let raw = flags
        .get(name)
        .ok_or_else(|| RecordError::MissingField(field.clone()))?;
    match raw.parse::<u32>() {
        Ok(p) if p <= 100 => Ok(p),
        _ => Err(RecordError::invalid(field, raw)),
    }
}
