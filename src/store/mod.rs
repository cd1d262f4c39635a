//! Local persistence: scoped key-value backends and typed handles.
//!
//! Where the synchronizers mirror state into the URL, this layer mirrors it
//! into a store. [`StoreBackend`] is the port, [`MemoryStore`] and
//! [`FileStore`] the bundled implementations, and [`Persisted`] the typed
//! value that reads itself at construction, persists on every set, and
//! follows external writes through a watch subscription.

pub mod backend;
pub mod file;
pub mod memory;
pub mod persisted;

pub use backend::{StoreBackend, StoreWatcher, WatchCallback};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use persisted::{Persisted, PersistedChangeFn};
