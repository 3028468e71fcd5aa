//! Durable state for the price service.
//!
//! One YAML document on disk holds the last good snapshot, the session
//! artifact, and the user configuration. Writes go to a sibling temp file
//! first and rename into place, so a crash mid-write can never leave a
//! corrupt document behind.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use argent_core::PersistedState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Flat-file store for [`PersistedState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted state, or `None` when nothing has been written
    /// yet — a missing file is a normal first start, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let state = serde_yaml::from_str(&raw)?;
        tracing::debug!(path = %self.path.display(), "persisted state loaded");
        Ok(Some(state))
    }

    /// Persists `state`, atomically replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document cannot be serialized or
    /// written.
    pub fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_yaml::to_string(state)?;
        let tmp = self.path.with_extension("yaml.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(raw.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "persisted state saved");
        Ok(())
    }
}
