//! In-memory store backend.
//!
//! A shared map with per-key change notifications. Clones share the same
//! entries and watcher registry, so two [`Persisted`] handles built on clones
//! of one store observe each other's writes the way two documents observe
//! each other through browser storage events.
//!
//! [`Persisted`]: crate::store::Persisted

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::domain::Result;
use crate::store::backend::{StoreBackend, StoreWatcher, WatchCallback};

/// Key-value store held entirely in memory.
///
/// Nothing survives the process; this backend exists for tests and for hosts
/// that want the [`Persisted`](crate::store::Persisted) change discipline
/// without a file.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, String>,
    watchers: Vec<(String, Weak<WatchCallback>)>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Invokes every live watcher of `key` with the new value.
    ///
    /// The borrow on the map is released before any callback runs, so
    /// watchers are free to read or write re-entrantly. Dead weak references
    /// are pruned on the way.
    fn notify(&self, key: &str, value: Option<&str>) {
        let callbacks: Vec<Rc<WatchCallback>> = {
            let mut inner = self.inner.borrow_mut();
            inner.watchers.retain(|(_, weak)| weak.strong_count() > 0);
            inner
                .watchers
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

impl StoreBackend for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.borrow().entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.entries.get(key).map(String::as_str) == Some(value) {
                return Ok(());
            }
            inner.entries.insert(key.to_owned(), value.to_owned());
        }
        debug!(key = %key, "stored value changed");
        self.notify(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = self.inner.borrow_mut().entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "stored value removed");
            self.notify(key, None);
        }
        Ok(())
    }

    fn watch(&self, key: &str, callback: Rc<WatchCallback>) -> StoreWatcher {
        self.inner
            .borrow_mut()
            .watchers
            .push((key.to_owned(), Rc::downgrade(&callback)));
        StoreWatcher::new(callback)
    }
}
