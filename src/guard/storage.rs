//! Persisted key-value state shared by every guard instance on one machine.
//!
//! The store is last-writer-wins with no read-modify-write protection. Two
//! processes failing logins at the same moment can under-count attempts.

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{debug, warn};

pub const KEY_ADMIN_EMAIL: &str = "adminEmail";
pub const KEY_LOGIN_TIME: &str = "adminLoginTime";
pub const KEY_LOGIN_ATTEMPTS: &str = "adminLoginAttempts";
pub const KEY_LOCKOUT_TIME: &str = "adminLockoutTime";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("state lock poisoned")]
    Poisoned,
}

pub trait StateStore: Send + Sync {
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same entries, which is how tests model
/// a second process reading what the first one wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten through a temp file and rename on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a damaged state file is moved to, `state.json.corrupt` for `state.json`.
    #[must_use]
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    // An unparsable file is moved aside and read as empty so writes succeed again.
    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let corrupt = self.corrupt_path();
                warn!(
                    "state file {} is not valid JSON ({err}), moved to {}",
                    self.path.display(),
                    corrupt.display()
                );
                fs::rename(&self.path, &corrupt)?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("state written to {}", self.path.display());

        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        if change(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_clones_share_entries() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set(KEY_LOGIN_ATTEMPTS, "2")?;
        assert_eq!(other.get(KEY_LOGIN_ATTEMPTS)?.as_deref(), Some("2"));

        other.remove(KEY_LOGIN_ATTEMPTS)?;
        assert_eq!(store.get(KEY_LOGIN_ATTEMPTS)?, None);

        // removing twice is fine
        store.remove(KEY_LOGIN_ATTEMPTS)?;
        Ok(())
    }

    #[test]
    fn file_store_missing_file_reads_empty() -> Result<(), StoreError> {
        let dir = TempDir::new()?;
        let store = FileStore::new(dir.path().join("state.json"));
        assert_eq!(store.get(KEY_ADMIN_EMAIL)?, None);
        store.remove(KEY_ADMIN_EMAIL)?;
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn file_store_persists_across_instances() -> Result<(), StoreError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("state.json");

        let first = FileStore::new(&path);
        first.set(KEY_ADMIN_EMAIL, "admin@example.com")?;
        first.set(KEY_LOGIN_TIME, "1700000000000")?;
        first.remove(KEY_LOGIN_TIME)?;

        let second = FileStore::new(&path);
        assert_eq!(
            second.get(KEY_ADMIN_EMAIL)?.as_deref(),
            Some("admin@example.com")
        );
        assert_eq!(second.get(KEY_LOGIN_TIME)?, None);
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }

    #[test]
    fn file_store_sets_corrupt_file_aside() -> Result<(), StoreError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("state.json");
        fs::write(&path, "{ truncated")?;

        let store = FileStore::new(&path);
        assert_eq!(store.get(KEY_ADMIN_EMAIL)?, None);
        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("state.json.corrupt"))?,
            "{ truncated"
        );

        store.set(KEY_LOGIN_ATTEMPTS, "1")?;
        assert_eq!(
            FileStore::new(&path).get(KEY_LOGIN_ATTEMPTS)?.as_deref(),
            Some("1")
        );
        Ok(())
    }
}
