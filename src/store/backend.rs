//! Store backend abstraction.
//!
//! The persistence layer mirrors the history layer's shape: a small port
//! trait, interior mutability behind `&self`, and RAII watch subscriptions.
//! Values are stored as strings; the typed layer on top ([`Persisted`])
//! decides how they are encoded.
//!
//! [`Persisted`]: crate::store::Persisted

use std::rc::Rc;

use crate::domain::Result;

/// Callback invoked when a watched key changes.
///
/// Receives the new stored value, or `None` when the key was removed.
pub type WatchCallback = dyn Fn(Option<&str>);

/// A scoped key-value store with change notifications.
///
/// All methods take `&self`: one store is typically shared by several
/// [`Persisted`](crate::store::Persisted) handles, so implementations keep
/// their data behind interior mutability.
///
/// Writes are change-driven: storing a value equal to the one already present
/// is a no-op that persists nothing and notifies nobody, and removing an
/// absent key is equally silent. Watchers therefore only ever see actual
/// changes.
pub trait StoreBackend {
    /// Returns the stored value for `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, notifying watchers of that key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted. Watchers are not
    /// notified of a failed write.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`, notifying watchers of that key with `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<()>;

    /// Subscribes to changes of a single key.
    ///
    /// The subscription lives exactly as long as the returned guard. The
    /// backend keeps only a weak reference to the callback, so dropping the
    /// guard unsubscribes without a separate call.
    ///
    /// # Parameters
    ///
    /// * `key` - The key to watch
    /// * `callback` - Invoked with the new value after every change to `key`
    ///
    /// # Returns
    ///
    /// The guard keeping the subscription alive.
    fn watch(&self, key: &str, callback: Rc<WatchCallback>) -> StoreWatcher;
}

/// Guard returned by [`StoreBackend::watch`]; the subscription ends when it
/// is dropped.
#[must_use = "dropping the watcher unsubscribes it immediately"]
pub struct StoreWatcher {
    _callback: Rc<WatchCallback>,
}

impl StoreWatcher {
    /// Wraps the strong reference that keeps a subscription alive.
    ///
    /// Backends call this after storing a [`Weak`](std::rc::Weak) to the same
    /// callback in their watcher registry.
    pub fn new(callback: Rc<WatchCallback>) -> Self {
        Self {
            _callback: callback,
        }
    }
}

impl std::fmt::Debug for StoreWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWatcher").finish_non_exhaustive()
    }
}
