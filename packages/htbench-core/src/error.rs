//! Harness error types.

use std::io::ErrorKind;

use thiserror::Error;

/// Errors that abort a whole sweep or analysis run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Result or graph directory could not be created
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Reading a directory listing or support file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Manifest or report (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Sweep plan cannot produce any trial
    #[error("Invalid sweep plan: {0}")]
    InvalidPlan(String),
}

/// Per-trial failures. These are logged and skipped, never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// External binary reported the failure marker
    #[error("external failure: {0}")]
    ExternalFailure(String),

    /// Output did not decode as a record literal
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Required key absent from the record
    #[error("missing field '{0}'")]
    MissingField(String),

    /// Key present but its value is unusable
    #[error("invalid value for '{field}': {value}")]
    InvalidField { field: String, value: String },

    /// Result file could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl RecordError {
    /// True when the external binary itself reported the failure.
    pub fn is_external_failure(&self) -> bool {
        matches!(self, RecordError::ExternalFailure(_))
    }

    pub(crate) fn invalid(field: impl Into<String>, value: impl ToString) -> Self {
        RecordError::InvalidField {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Classifies I/O errors into HarnessError variants.
///
/// Anything that touches directory setup is a filesystem failure; the
/// rest is reported as plain I/O.
pub fn classify_io_error(error: std::io::Error, context: &str) -> HarnessError {
    match error.kind() {
        ErrorKind::AlreadyExists
        | ErrorKind::PermissionDenied
        | ErrorKind::StorageFull
        | ErrorKind::ReadOnlyFilesystem
        | ErrorKind::NotADirectory => HarnessError::Filesystem(format!("{}: {}", context, error)),
        _ => HarnessError::Io(format!("{}: {}", context, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_io_error() {
        let err = std::io::Error::new(ErrorKind::AlreadyExists, "exists");
        assert!(matches!(
            classify_io_error(err, "create sweep dir"),
            HarnessError::Filesystem(msg) if msg.starts_with("create sweep dir")
        ));

        let err = std::io::Error::new(ErrorKind::InvalidData, "garbage");
        assert!(matches!(
            classify_io_error(err, "read manifest"),
            HarnessError::Io(_)
        ));
    }

    #[test]
    fn test_external_failure_flag() {
        assert!(RecordError::ExternalFailure("FATAL".into()).is_external_failure());
        assert!(!RecordError::MissingField("table".into()).is_external_failure());
    }
}
