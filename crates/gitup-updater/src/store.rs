//! Site-scoped option storage.
//!
//! This module defines the `OptionStore` trait the error log persists
//! through, an in-memory implementation for tests and embedding hosts, and a
//! JSON file implementation for standalone use.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;

/// Key/value persistence for JSON option values.
///
/// Writes replace the whole value stored under a key.
pub trait OptionStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-memory option store.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<HashMap<String, Value>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let options = self.options.read().map_err(|_| StoreError::Poisoned)?;
        Ok(options.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut options = self.options.write().map_err(|_| StoreError::Poisoned)?;
        options.insert(key.to_string(), value);
        Ok(())
    }
}

/// Option store backed by a single JSON object file.
///
/// Every `set` holds an exclusive advisory lock on a sibling `.lock` file for
/// the whole read-modify-write, then replaces the file through a synced
/// temporary sibling and a rename. Readers take a shared lock.
///
/// A file that exists but is not a JSON object is an error, never an empty
/// store: writing over it would drop every other key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// `dir/.options.json.<suffix>`
    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.{suffix}"))
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: self.display_path(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Open the lock file and lock it. The lock is released when the
    /// returned handle is dropped.
    fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        let lock_path = self.sibling("lock");
        let lock_err = |source| StoreError::Lock {
            path: lock_path.display().to_string(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(lock_err)?;

        if exclusive {
            FileExt::lock_exclusive(&file).map_err(lock_err)?;
        } else {
            FileExt::lock_shared(&file).map_err(lock_err)?;
        }
        Ok(file)
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No option store at {:?}, starting empty", self.path);
                return Ok(Map::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.display_path(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt {
                path: self.display_path(),
                message: "top-level value is not a JSON object".to_string(),
            }),
            Err(e) => Err(StoreError::Corrupt {
                path: self.display_path(),
                message: e.to_string(),
            }),
        }
    }

    fn write_all(&self, options: &Map<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(options).map_err(|e| StoreError::Encode {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        let tmp_path = self.sibling(&format!("{}.tmp", std::process::id()));
        let tmp_err = |source| StoreError::Write {
            path: tmp_path.display().to_string(),
            source,
        };

        let mut tmp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(tmp_err)?;
        tmp.write_all(&content).map_err(tmp_err)?;
        tmp.sync_all().map_err(tmp_err)?;
        drop(tmp);

        std::fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.display_path(),
            source,
        })?;
        debug!("Saved option store to {:?}", self.path);
        Ok(())
    }
}

impl OptionStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let _guard = self.lock(false)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_parent()?;
        let _guard = self.lock(true)?;

        let mut options = self.read_all()?;
        options.insert(key.to_string(), value);
        self.write_all(&options)
    }
}
