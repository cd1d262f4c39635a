//! History port and the in-memory backend.
//!
//! [`History`] is the seam between the synchronizers and whatever actually
//! owns navigation. [`MemoryHistory`] is the bundled implementation: an
//! entry stack with a cursor and synchronous listener fan-out.

pub mod backend;
pub mod location;
pub mod memory;

pub use backend::{History, HistoryListener, NavigateCallback};
pub use location::{EntryPayload, Location};
pub use memory::MemoryHistory;
