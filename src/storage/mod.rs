/// Local key-value persistence backed by one JSON document per key
pub mod history;
pub mod preferences;

pub use history::{HistoryStore, InterpretationHistoryEntry};
pub use preferences::{Preferences, PreferencesStore};

use crate::error::{InterpreterError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory of `<key>.json` documents.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so readers never see a partial document. There is no locking
/// between processes; the last writer wins.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!("📁 Storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read and decode a key, `None` when nothing has been stored
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Encode and atomically replace a key
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json_content = serde_json::to_string_pretty(value)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json_content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key))
            .map_err(|e| InterpreterError::Storage(format!("failed to replace {}: {}", key, e.error)))?;

        debug!("💾 Wrote key {} ({} bytes)", key, json_content.len());
        Ok(())
    }
}
