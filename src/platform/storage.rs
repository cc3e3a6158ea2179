//! Key/value blob storage
//!
//! LocalStorage in the browser, one file per key natively, a map in tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{GameError, GameResult};

/// Durable string blobs addressed by a fixed key
pub trait KeyValueStore {
    /// Read a blob, `Ok(None)` if it was never written
    fn get(&self, key: &'static str) -> GameResult<Option<String>>;
    fn set(&mut self, key: &'static str, value: &str) -> GameResult<()>;
}

/// In-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<&'static str, String>,
    /// Reject every write (simulates a full or revoked storage quota)
    pub fail_writes: bool,
    /// Reject every read (simulates storage blocked by the browser)
    pub fail_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a blob, bypassing `fail_writes`
    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        self.blobs.insert(key, value.into());
    }

    pub fn raw(&self, key: &'static str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &'static str) -> GameResult<Option<String>> {
        if self.fail_reads {
            return Err(GameError::Storage {
                key,
                reason: "reads disabled".to_string(),
            });
        }
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &'static str, value: &str) -> GameResult<()> {
        if self.fail_writes {
            return Err(GameError::Storage {
                key,
                reason: "writes disabled".to_string(),
            });
        }
        self.blobs.insert(key, value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per blob under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &'static str) -> GameResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GameError::Storage {
                key,
                reason: e.to_string(),
            }),
        }
    }

    fn set(&mut self, key: &'static str, value: &str) -> GameResult<()> {
        let to_err = |e: std::io::Error| GameError::Storage {
            key,
            reason: e.to_string(),
        };
        fs::create_dir_all(&self.dir).map_err(to_err)?;
        // Write-then-rename so a crash never leaves a half-written blob
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).map_err(to_err)?;
        fs::rename(&tmp, self.path(key)).map_err(to_err)
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage(key: &'static str) -> GameResult<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| GameError::Storage {
                key,
                reason: "LocalStorage unavailable".to_string(),
            })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &'static str) -> GameResult<Option<String>> {
        Self::storage(key)?
            .get_item(key)
            .map_err(|e| GameError::Storage {
                key,
                reason: format!("{:?}", e),
            })
    }

    fn set(&mut self, key: &'static str, value: &str) -> GameResult<()> {
        Self::storage(key)?
            .set_item(key, value)
            .map_err(|e| GameError::Storage {
                key,
                reason: format!("{:?}", e),
            })
    }
}
