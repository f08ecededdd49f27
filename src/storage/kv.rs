//! Key-addressed JSON persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::storage::StorageError;

/// Minimal persistence interface the navigation store is written against.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn put(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, optionally mirrored to a JSON snapshot file after every
/// change.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Value>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// An empty store with no snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a snapshot-backed store, loading the file if it exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let store = Self {
            inner: Arc::new(DashMap::new()),
            snapshot_path: Some(path.to_path_buf()),
        };

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, Value> = serde_json::from_reader(reader)?;
            for (k, v) in map {
                store.inner.insert(k, v);
            }
            tracing::info!(path = %path.display(), keys = store.inner.len(), "Loaded store snapshot");
        }
        Ok(store)
    }

    /// Write the snapshot file, if one is configured.
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed over the old one, so readers never see a partial file.
    pub fn save_to_file(&self) -> Result<(), StorageError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let map: HashMap<String, Value> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), keys = map.len(), "Saved store snapshot");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.inner.insert(key.to_string(), value);
        self.save_to_file()
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key);
        self.save_to_file()
    }
}
