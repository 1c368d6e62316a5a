//! quotebook-store: durable key-value storage for Quotebook subsystems.
//!
//! Design rules:
//! - Backends store opaque text under fixed string keys; serialization
//!   belongs to the caller.
//! - The backend is swappable behind [`StorageBackend`] so consumers never
//!   hard-code a storage technology.
//! - Reads distinguish "key absent" (`Ok(None)`) from real failures.
//! - Writers sharing a key across process boundaries are last-writer-wins;
//!   backends do not arbitrate.

use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File extension used by [`FileStore`] for stored values.
pub const STORE_FILE_EXT: &str = "json";

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable text-valued key-value store.
///
/// Keys are short fixed identifiers chosen by the caller (file stems for
/// [`FileStore`]); callers owning distinct data must use distinct keys.
pub trait StorageBackend {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`. Removing an absent key is fine.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory backend for tests and non-persistent deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, simulating quota exhaustion or a
    /// disabled storage area. Reads still serve whatever was seeded.
    pub fn failing() -> Self {
        Self {
            map: HashMap::new(),
            fail_writes: true,
        }
    }

    // Test support. Public because downstream crates' tests seed and inspect
    // stores directly, but kept out of the documented surface.

    /// Seed a value directly, bypassing the failure switch.
    #[doc(hidden)]
    pub fn seed(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    #[doc(hidden)]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }
}

impl StorageBackend for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("write quota exceeded".into()));
        }
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("write quota exceeded".into()));
        }
        self.map.remove(key);
        Ok(())
    }
}

/// File-per-key backend: `key` maps to `<root>/<key>.json`.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("create store root: {}", root.display()))?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{STORE_FILE_EXT}"))
    }
}

impl StorageBackend for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
