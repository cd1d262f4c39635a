//! JSON file-based store backend.
//!
//! A single human-readable JSON file holding every entry, written atomically
//! (write-to-temp + rename) so a crash never leaves a corrupt file behind.
//! The whole dataset is kept in memory and persisted on every modification;
//! a dirty flag plus a save on drop catch the case where an earlier save
//! failed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::domain::{Result, UrlStateError};
use crate::store::backend::{StoreBackend, StoreWatcher, WatchCallback};

/// File container format.
///
/// The version field exists for future migrations; entries are kept flat so
/// the file stays diffable and hand-editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    /// Version of the store format.
    version: u32,

    /// All stored entries, keyed by name.
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

/// Store backend persisting to a single JSON file.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "entries": {
///     "theme": "\"dark\"",
///     "sidebar": "true"
///   }
/// }
/// ```
///
/// Entry values are opaque strings; [`Persisted`](crate::store::Persisted)
/// stores JSON-encoded text in them, which is why the example values are
/// quoted twice.
pub struct FileStore {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory data cache, loaded on creation.
    data: RefCell<StoreData>,

    /// Tracks whether data has been modified since the last successful save.
    dirty: Cell<bool>,

    watchers: RefCell<Vec<(String, Weak<WatchCallback>)>>,
}

impl FileStore {
    /// Creates or opens a file store.
    ///
    /// If the file exists, loads existing data. Otherwise starts empty; the
    /// file appears on the first write. Parent directories are created
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but contains invalid JSON
    /// - File permissions prevent reading
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing file store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            tracing::debug!("loading existing data");
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty store");
            StoreData::default()
        };

        tracing::debug!(entry_count = data.entries.len(), "store initialized");

        Ok(Self {
            file_path,
            data: RefCell::new(data),
            dirty: Cell::new(false),
            watchers: RefCell::new(Vec::new()),
        })
    }

    /// Loads store data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    fn load_from_file(path: &PathBuf) -> Result<StoreData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&contents)
            .map_err(|e| UrlStateError::Storage(format!("failed to parse store file: {e}")))?;

        tracing::debug!(
            version = data.version,
            entries = data.entries.len(),
            "loaded store data"
        );

        Ok(data)
    }

    /// Saves store data to disk using an atomic write.
    ///
    /// Writes to a temporary file first, then renames it onto the target
    /// path, so the file is never left half-written even if the process
    /// crashes mid-save.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the temporary write, or the rename
    /// fails. The dirty flag stays set on failure so the drop handler retries.
    fn save_to_file(&self) -> Result<()> {
        if !self.dirty.get() {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        tracing::debug!(path = ?self.file_path, "saving store data");

        let json = serde_json::to_string_pretty(&*self.data.borrow())
            .map_err(|e| UrlStateError::Storage(format!("failed to serialize store: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty.set(false);
        tracing::debug!("store saved successfully");
        Ok(())
    }

    /// Invokes every live watcher of `key` with the new value.
    ///
    /// Borrows are released before any callback runs; dead weak references
    /// are pruned on the way.
    fn notify(&self, key: &str, value: Option<&str>) {
        let callbacks: Vec<Rc<WatchCallback>> = {
            let mut watchers = self.watchers.borrow_mut();
            watchers.retain(|(_, weak)| weak.strong_count() > 0);
            watchers
                .iter()
                .filter(|(watched, _)| watched == key)
                .filter_map(|(_, weak)| weak.upgrade())
                .collect()
        };
        for callback in callbacks {
            callback(value);
        }
    }
}

impl StoreBackend for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.borrow().entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let _span = tracing::debug_span!("store_write", key = %key).entered();

        {
            let mut data = self.data.borrow_mut();
            if data.entries.get(key).map(String::as_str) == Some(value) {
                tracing::trace!("value unchanged, skipping write");
                return Ok(());
            }
            data.entries.insert(key.to_owned(), value.to_owned());
        }
        self.dirty.set(true);
        self.save_to_file()?;

        self.notify(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _span = tracing::debug_span!("store_remove", key = %key).entered();

        let removed = self.data.borrow_mut().entries.remove(key).is_some();
        if !removed {
            tracing::trace!("key absent, nothing to remove");
            return Ok(());
        }
        self.dirty.set(true);
        self.save_to_file()?;

        self.notify(key, None);
        Ok(())
    }

    fn watch(&self, key: &str, callback: Rc<WatchCallback>) -> StoreWatcher {
        self.watchers
            .borrow_mut()
            .push((key.to_owned(), Rc::downgrade(&callback)));
        StoreWatcher::new(callback)
    }
}

impl Drop for FileStore {
    /// Retries the save on drop if an earlier one failed.
    fn drop(&mut self) {
        if self.dirty.get() {
            tracing::debug!("saving dirty data on drop");
            if let Err(e) = self.save_to_file() {
                tracing::error!(error = %e, "failed to save on drop");
            }
        }
    }
}
