//! Key-value namespaces that back the content cache.
//!
//! A store holds opaque strings. It knows nothing about envelopes or
//! expiry; it may also hold keys written by someone else.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read cache file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cache file {path} is not a JSON object of strings: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write cache file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode cache file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string-to-string namespace.
pub trait CacheStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be persisted.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove `key`; absent keys are not an error.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Every key in the namespace, in a stable order.
    fn keys(&self) -> Vec<String>;

    /// Remove every key in the namespace.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be persisted.
    fn clear(&mut self) -> Result<(), StoreError>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Namespace that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Namespace persisted as a single JSON object file.
///
/// The whole file is loaded on open and rewritten after every mutation, so
/// it survives across runs the way browser storage survives reloads.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the namespace at `path`. A missing file is an empty namespace.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file each mutation is written to before being renamed over
    /// the cache file at `path`.
    pub fn temp_path_for(path: &Path) -> PathBuf {
        path.with_extension("tmp")
    }

    fn persist(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = Self::temp_path_for(&self.path);
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.persist()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
