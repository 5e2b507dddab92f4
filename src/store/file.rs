// SPDX-License-Identifier: MIT

//! File-backed store standing in for browser local storage.
//!
//! The whole store is one JSON object on disk, rewritten on every mutation.
//! That is acceptable at this scale: the store holds a handful of small
//! cache entries and mutations are driven by infrequent UI events.

use super::KeyValueStore;
use crate::error::AppError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key-value store persisted as a single JSON file.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at `path`.
    ///
    /// A missing file is an empty store; an unreadable or corrupt file is
    /// logged and treated as empty rather than failing the caller.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Store file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Write the current snapshot to disk.
    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        let raw = serde_json::to_string(entries)
            .map_err(|e| AppError::Storage(format!("serialize store: {}", e)))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| AppError::Storage(format!("write {}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Store read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let Ok(mut entries) = self.entries.lock() else {
            tracing::warn!(key, "Store write failed: poisoned lock");
            return;
        };
        entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            tracing::warn!(key, error = %e, "Store write failed");
        }
    }

    fn remove(&self, key: &str) {
        let Ok(mut entries) = self.entries.lock() else {
            tracing::warn!(key, "Store remove failed: poisoned lock");
            return;
        };
        if entries.remove(key).is_some() {
            if let Err(e) = self.persist(&entries) {
                tracing::warn!(key, error = %e, "Store remove failed");
            }
        }
    }
}
