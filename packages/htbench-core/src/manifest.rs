//! Sweep manifest: the trials a sweep ran and where their output went.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{classify_io_error, HarnessError};
use crate::workload::Trial;

/// File name of the manifest inside a sweep directory.
pub const MANIFEST_FILE: &str = "sweep-manifest.json";

/// Manifest format version.
const MANIFEST_VERSION: u32 = 1;

/// Trial and the output file it wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub trial: Trial,
}

/// Manifest file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepManifest {
    /// Format version
    pub version: u32,
    /// Name of the plan that produced the sweep
    pub plan: String,
    /// Sweep start timestamp
    pub timestamp: String,
    /// Logical cores on the host that ran the sweep
    pub host_cores: usize,
    /// Trials in run order
    pub entries: Vec<ManifestEntry>,
}

impl SweepManifest {
    pub fn new(plan: impl Into<String>, timestamp: impl Into<String>, host_cores: usize) -> Self {
        Self {
            version: MANIFEST_VERSION,
            plan: plan.into(),
            timestamp: timestamp.into(),
            host_cores,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, file: impl Into<String>, trial: Trial) {
        self.entries.push(ManifestEntry {
            file: file.into(),
            trial,
        });
    }

    /// Trial that wrote `file`, if recorded.
    pub fn trial_for(&self, file: &str) -> Option<&Trial> {
        self.entries
            .iter()
            .find(|entry| entry.file == file)
            .map(|entry| &entry.trial)
    }

    /// Writes the manifest into `dir`, replacing any previous one atomically.
    pub fn save(&self, dir: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| HarnessError::Serialization(e.to_string()))?;

        let temp_path = dir.join(format!("{}.tmp", MANIFEST_FILE));
        let final_path = dir.join(MANIFEST_FILE);

        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create manifest temp file"))?;
        file.write_all(json.as_bytes())
            .map_err(|e| classify_io_error(e, "Failed to write manifest"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync manifest"))?;

        fs::rename(&temp_path, &final_path)
            .map_err(|e| classify_io_error(e, "Failed to rename manifest"))?;
        Ok(())
    }

    /// Loads the manifest of `dir`. A sweep without one yields `None`.
    pub fn load(dir: &Path) -> Result<Option<Self>, HarnessError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| classify_io_error(e, "Failed to read manifest"))?;
        let manifest: SweepManifest = serde_json::from_str(&contents)
            .map_err(|e| HarnessError::Serialization(format!("Failed to parse manifest: {}", e)))?;

        if manifest.version != MANIFEST_VERSION {
            return Err(HarnessError::Serialization(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }
}
