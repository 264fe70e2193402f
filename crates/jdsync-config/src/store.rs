//! Key/value persistence backends.
//!
//! The host environment owns persistence; jdsync only needs to read and
//! write small string values. [`KvStore`] is that seam. Two backends ship
//! with the crate:
//!
//! - [`MemoryStore`]: process-local, for tests and embedding
//! - [`FileStore`]: a JSON object on disk, used by the CLI
//!
//! Neither backend offers cross-process locking. Concurrent invocations may
//! interleave read and write; callers are expected to tolerate that.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::error::{ConfigError, Result};

/// Application directory name under the platform data dir.
const APP_NAME: &str = "jdsync";

/// Default store filename.
const STORE_FILE: &str = "store.json";

/// A flat string key/value store.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Read a value. Missing keys return `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn KvStore>;

/// Default location of the file store: `<data_dir>/jdsync/store.json`.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(STORE_FILE)
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given pairs.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Snapshot of every stored pair.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().clone()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileStore
// ─────────────────────────────────────────────────────────────────────────────

/// JSON-file backed store.
///
/// Every read goes to disk so values written by other processes are seen.
/// Writes replace the file through a uniquely named temporary sibling and a
/// rename, so concurrent writers never share a scratch file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) the store at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at [`default_store_path`].
    pub fn open_default() -> Self {
        Self::new(default_store_path())
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.is_file() {
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadStore {
            path: self.path.display().to_string(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| ConfigError::ParseStore {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let write_err = |path: &Path, source: std::io::Error| ConfigError::WriteStore {
            path: path.display().to_string(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;

        let contents = serde_json::to_string_pretty(values).map_err(|e| ConfigError::ParseStore {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| write_err(parent, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| write_err(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| write_err(&self.path, e.error))?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)?;
        tracing::trace!(key, path = %self.path.display(), "Store value written");
        Ok(())
    }
}
