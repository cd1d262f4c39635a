//! Typed values bound to a store key.
//!
//! [`Persisted`] is the store-layer sibling of the synchronizers: a current
//! value, a backing location, and a subscription that keeps the two in sync.
//! The cell is committed before the backend write, so the watcher recognizes
//! the echo of its own write by equality and stays quiet; only genuinely
//! external writes change the cell and reach the change callback.

use std::cell::RefCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Result, UrlStateError};
use crate::store::backend::{StoreBackend, StoreWatcher};

/// Callback invoked with the new value after an external write changed it.
pub type PersistedChangeFn<T> = dyn Fn(&T);

/// A typed value persisted under a single store key.
///
/// The value is read once at construction: a missing key yields `initial`,
/// and a stored value that does not decode as `T` is logged and discarded in
/// favor of `initial` rather than failing the construction. From then on
/// every [`set`](Persisted::set) encodes the value as JSON and writes it
/// through the backend, and every external write to the same key is decoded
/// back into the handle.
///
/// Removal of the key leaves the current value in place; only a decodable
/// replacement value moves it.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use urlstate::store::{MemoryStore, Persisted};
///
/// let store = Rc::new(MemoryStore::new());
///
/// let sidebar = Persisted::new(Rc::clone(&store) as _, "sidebar", false);
/// sidebar.set(true).unwrap();
///
/// // A second handle on the same key starts from the stored value.
/// let mirror: Persisted<bool> = Persisted::new(Rc::clone(&store) as _, "sidebar", false);
/// assert!(mirror.get());
///
/// // And writes through one handle reach the other.
/// mirror.set(false).unwrap();
/// assert!(!sidebar.get());
/// ```
pub struct Persisted<T> {
    inner: Rc<Inner<T>>,
    _watcher: StoreWatcher,
}

struct Inner<T> {
    backend: Rc<dyn StoreBackend>,
    key: String,
    value: RefCell<T>,
    on_change: Option<Rc<PersistedChangeFn<T>>>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + 'static,
{
    /// Binds a typed value to `key` on the given backend.
    ///
    /// # Parameters
    ///
    /// * `backend` - The store to read from and write through
    /// * `key` - The key this value lives under
    /// * `initial` - Fallback when the key is absent or holds corrupt data
    pub fn new(backend: Rc<dyn StoreBackend>, key: impl Into<String>, initial: T) -> Self {
        Self::build(backend, key.into(), initial, None)
    }

    /// Like [`new`](Persisted::new), with a callback for external changes.
    ///
    /// The callback fires after the cell moved because some other writer
    /// changed the key; this handle's own [`set`](Persisted::set) calls never
    /// trigger it.
    pub fn with_on_change(
        backend: Rc<dyn StoreBackend>,
        key: impl Into<String>,
        initial: T,
        on_change: impl Fn(&T) + 'static,
    ) -> Self {
        Self::build(backend, key.into(), initial, Some(Rc::new(on_change)))
    }

    fn build(
        backend: Rc<dyn StoreBackend>,
        key: String,
        initial: T,
        on_change: Option<Rc<PersistedChangeFn<T>>>,
    ) -> Self {
        let value = match backend.read(&key) {
            Ok(Some(stored)) => match serde_json::from_str(&stored) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = %key, error = %e, "stored value is corrupt, using initial");
                    initial
                }
            },
            Ok(None) => initial,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read stored value, using initial");
                initial
            }
        };

        let inner = Rc::new(Inner {
            backend: Rc::clone(&backend),
            key,
            value: RefCell::new(value),
            on_change,
        });

        let watcher_inner = Rc::clone(&inner);
        let watcher = backend.watch(
            &inner.key,
            Rc::new(move |raw: Option<&str>| {
                watcher_inner.adopt(raw);
            }),
        );

        Self {
            inner,
            _watcher: watcher,
        }
    }

    /// Returns the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// The store key this value lives under.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Replaces the value and persists it.
    ///
    /// The cell is committed first; when persisting fails the new value is
    /// still current and the error reports only that it did not reach the
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or the backend write
    /// fails.
    pub fn set(&self, value: T) -> Result<()> {
        self.inner.commit(value)
    }

    /// Derives the next value from the current one and persists it.
    ///
    /// The closure always receives the last committed value, never a stale
    /// snapshot held by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or the backend write
    /// fails.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.inner.value.borrow().clone();
        self.inner.commit(f(&current))
    }
}

impl<T> Inner<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq,
{
    fn commit(&self, value: T) -> Result<()> {
        debug!(key = %self.key, "persisting new value");
        *self.value.borrow_mut() = value.clone();

        let encoded = serde_json::to_string(&value).map_err(|e| {
            UrlStateError::Codec(format!("failed to encode value for {}: {e}", self.key))
        })?;
        self.backend.write(&self.key, &encoded)
    }

    /// Watcher path: decode an external write and adopt it unless it is our
    /// own echo or fails to decode.
    fn adopt(&self, raw: Option<&str>) {
        // A removed key keeps the current value.
        let Some(raw) = raw else { return };
        let new_value: T = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "ignoring corrupt external write");
                return;
            }
        };

        if *self.value.borrow() == new_value {
            return;
        }

        debug!(key = %self.key, "adopting externally written value");
        *self.value.borrow_mut() = new_value.clone();
        if let Some(on_change) = &self.on_change {
            on_change(&new_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    fn shared(store: &MemoryStore) -> Rc<dyn StoreBackend> {
        Rc::new(store.clone())
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        columns: u8,
    }

    #[test]
    fn missing_key_yields_the_initial_value() {
        let store = MemoryStore::new();
        let sidebar = Persisted::new(shared(&store), "sidebar", false);
        assert!(!sidebar.get());
        // Construction alone writes nothing.
        assert!(store.is_empty());
    }

    #[test]
    fn stored_value_overrides_the_initial() {
        let store = MemoryStore::new();
        store.write("sidebar", "true").unwrap();

        let sidebar = Persisted::new(shared(&store), "sidebar", false);
        assert!(sidebar.get());
    }

    #[test]
    fn corrupt_stored_value_falls_back_to_the_initial() {
        let store = MemoryStore::new();
        store.write("columns", "not a number").unwrap();

        let columns: Persisted<u8> = Persisted::new(shared(&store), "columns", 3);
        assert_eq!(columns.get(), 3);
    }

    #[test]
    fn set_commits_and_persists() {
        let store = MemoryStore::new();
        let prefs = Persisted::new(
            shared(&store),
            "prefs",
            Prefs {
                theme: "light".into(),
                columns: 3,
            },
        );

        prefs
            .set(Prefs {
                theme: "dark".into(),
                columns: 4,
            })
            .unwrap();

        assert_eq!(prefs.get().theme, "dark");
        assert_eq!(
            store.read("prefs").unwrap().as_deref(),
            Some(r#"{"theme":"dark","columns":4}"#)
        );
    }

    #[test]
    fn update_resolves_against_the_committed_value() {
        let store = MemoryStore::new();
        let counter = Persisted::new(shared(&store), "counter", 0u32);

        counter.set(5).unwrap();
        counter.update(|current| current + 1).unwrap();

        assert_eq!(counter.get(), 6);
        assert_eq!(store.read("counter").unwrap().as_deref(), Some("6"));
    }

    #[test]
    fn external_writes_move_the_value_and_notify() {
        let store = MemoryStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sidebar = Persisted::with_on_change(shared(&store), "sidebar", false, move |v: &bool| {
            sink.borrow_mut().push(*v);
        });

        store.write("sidebar", "true").unwrap();

        assert!(sidebar.get());
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn own_writes_never_reach_the_change_callback() {
        let store = MemoryStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sidebar = Persisted::with_on_change(shared(&store), "sidebar", false, move |v: &bool| {
            sink.borrow_mut().push(*v);
        });

        sidebar.set(true).unwrap();
        assert!(sidebar.get());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn corrupt_external_writes_are_ignored() {
        let store = MemoryStore::new();
        let columns: Persisted<u8> = Persisted::new(shared(&store), "columns", 3);

        store.write("columns", "garbage").unwrap();
        assert_eq!(columns.get(), 3);
    }

    #[test]
    fn removal_keeps_the_current_value() {
        let store = MemoryStore::new();
        let sidebar = Persisted::new(shared(&store), "sidebar", false);

        sidebar.set(true).unwrap();
        store.remove("sidebar").unwrap();

        assert!(sidebar.get());
    }

    #[test]
    fn two_handles_on_one_key_stay_in_sync() {
        let store = MemoryStore::new();
        let left = Persisted::new(shared(&store), "sidebar", false);
        let right: Persisted<bool> = Persisted::new(shared(&store), "sidebar", false);

        left.set(true).unwrap();
        assert!(right.get());

        right.set(false).unwrap();
        assert!(!left.get());
    }

    #[test]
    fn dropping_the_handle_stops_adoption() {
        let store = MemoryStore::new();
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        let sidebar = Persisted::with_on_change(shared(&store), "sidebar", false, move |_: &bool| {
            *sink.borrow_mut() += 1;
        });

        store.write("sidebar", "true").unwrap();
        assert_eq!(*seen.borrow(), 1);

        drop(sidebar);
        store.write("sidebar", "false").unwrap();
        assert_eq!(*seen.borrow(), 1);
    }
}
