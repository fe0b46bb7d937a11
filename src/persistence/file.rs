//! JSON file backend for native builds
//!
//! The whole key/value map lives in one JSON object file that is rewritten
//! on every change, mirroring LocalStorage semantics on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::store::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store file. A missing file starts empty; an unreadable or
    /// corrupt one is logged and also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str::<BTreeMap<String, String>>(&data) {
                    Ok(map) => map,
                    Err(e) => {
                        log::warn!("Failed to parse store file {}: {}", path.display(), e);
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read store file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        log::debug!("Opened store {} ({} keys)", path.display(), entries.len());
        Self { path, entries }
    }

    /// Write `entries` to disk and adopt them only once the write succeeded
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json)?;
        self.entries = entries;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.commit(entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut entries = self.entries.clone();
        entries.remove(key);
        self.commit(entries)
    }
}
