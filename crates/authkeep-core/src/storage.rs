//! Durable key-value storage for the persisted auth subset.
//!
//! The store never touches the filesystem directly; it writes JSON strings
//! through the [`StateStorage`] trait. [`FileStorage`] is the production
//! implementation (one file per slot under the authkeep home directory,
//! written with restricted permissions). [`MemoryStorage`] is the test
//! double.
//!
//! AUTHKEEP_HOME resolution order:
//! 1. AUTHKEEP_HOME environment variable (if set)
//! 2. ~/.config/authkeep (default)

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};

/// Returns the authkeep home directory.
///
/// Checks AUTHKEEP_HOME env var first, falls back to ~/.config/authkeep
pub fn authkeep_home() -> PathBuf {
    if let Ok(home) = std::env::var("AUTHKEEP_HOME") {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .map(|h| h.join(".config").join("authkeep"))
        .expect("Could not determine home directory")
}

/// A durable string-keyed slot store.
///
/// Keys are slot names, values are JSON documents. There is intentionally no
/// `remove`: logout overwrites the slot with empty defaults rather than
/// deleting it.
pub trait StateStorage {
    /// Reads the value stored under `key`, or `None` if the slot is absent.
    ///
    /// # Errors
    /// Returns an error if the slot exists but cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// File-backed storage: one `<dir>/<key>.json` file per slot.
///
/// Writes are atomic (temp file + rename) with 0600 permissions on Unix.
/// Slot contents may hold credentials and are never logged in full.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at an explicit directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Creates a storage rooted at the authkeep home directory.
    pub fn default_location() -> Self {
        Self::new(authkeep_home())
    }

    /// Returns the path of the file backing a slot.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("json.tmp");

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(value.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&tmp_path, value)
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// In-memory storage for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-seeded with a single slot.
    pub fn with_slot(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .slots
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("storage mutex poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("storage mutex poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
