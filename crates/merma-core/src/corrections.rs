//! Human-correction store for motive categorization
//!
//! A persisted comment → category mapping that survives across runs. The
//! engine reads it once as a snapshot at the start of a run (override +
//! few-shot guidance) and the caller merge-writes it once after a human has
//! confirmed reclassifications. Writes go through a temp file in the same
//! directory so a crash never leaves a half-written store.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Exact comment text → category label
pub type CorrectionsMap = BTreeMap<String, String>;

/// File-backed corrections store
#[derive(Debug, Clone)]
pub struct CorrectionStore {
    path: PathBuf,
}

impl CorrectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory
    /// (`~/.local/share/merma/corrections.json` on Linux)
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("merma")
            .join("corrections.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot the store. A missing file is an empty map, not an error.
    pub fn load(&self) -> Result<CorrectionsMap> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let map: CorrectionsMap = serde_json::from_str(&contents).map_err(|e| {
                    Error::Corrections(format!(
                        "Corrupt corrections file {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                debug!(entries = map.len(), "Loaded corrections");
                Ok(map)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CorrectionsMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `updates` into the persisted map atomically: existing keys are
    /// overwritten, new keys added, everything else kept.
    pub fn merge_write(&self, updates: &CorrectionsMap) -> Result<CorrectionsMap> {
        let mut merged = self.load()?;
        for (comment, category) in updates {
            merged.insert(comment.clone(), category.clone());
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &merged)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Corrections(format!("Unable to persist corrections: {}", e)))?;

        debug!(entries = merged.len(), added = updates.len(), "Merged corrections");
        Ok(merged)
    }

    /// Remove one correction by its exact comment text. Returns whether the
    /// key existed.
    pub fn remove(&self, comment: &str) -> Result<bool> {
        let mut map = self.load()?;
        let existed = map.remove(comment).is_some();
        if existed {
            let dir = self
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            serde_json::to_writer_pretty(&mut tmp, &map)?;
            tmp.write_all(b"\n")?;
            tmp.persist(&self.path)
                .map_err(|e| Error::Corrections(format!("Unable to persist corrections: {}", e)))?;
        }
        Ok(existed)
    }
}
