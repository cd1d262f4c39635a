//! History port definition.
//!
//! The synchronizers never touch a process-global history. They talk to this
//! trait, so a host can hand them a browser-backed stack, a server-side
//! recorder, or the in-memory implementation used throughout the test suite.

use std::rc::Rc;

use crate::history::{EntryPayload, Location};

/// Callback invoked after every navigation with the entry navigated to.
pub type NavigateCallback = dyn Fn(&Location);

/// A navigable history stack.
///
/// All methods take `&self`: a history is shared by every synchronizer bound
/// to it, so implementations keep their stack behind interior mutability.
/// Navigation calls are synchronous and notify listeners before returning,
/// which the synchronizers rely on to recognize their own navigations.
pub trait History {
    /// Returns a snapshot of the current entry.
    fn location(&self) -> Location;

    /// Appends a new entry after the current one and moves to it.
    ///
    /// Entries ahead of the current position are discarded, the way a
    /// browser drops its forward stack on a fresh navigation.
    ///
    /// # Parameters
    ///
    /// * `path` - Relative URL of the new entry (`path?search#hash`)
    /// * `payload` - Synchronizer payload to attach to the entry
    fn push(&self, path: &str, payload: Option<EntryPayload>);

    /// Swaps the current entry in place without growing the stack.
    ///
    /// # Parameters
    ///
    /// * `path` - Relative URL replacing the current entry
    /// * `payload` - Synchronizer payload to attach to the entry
    fn replace(&self, path: &str, payload: Option<EntryPayload>);

    /// Moves one entry back, if there is one.
    ///
    /// At the oldest entry this is a no-op: nothing moves and no listener
    /// fires.
    fn go_back(&self);

    /// Subscribes to navigation events.
    ///
    /// The subscription lives exactly as long as the returned guard. The
    /// backend keeps only a weak reference to the callback, so dropping the
    /// guard unsubscribes without a separate call.
    ///
    /// # Parameters
    ///
    /// * `callback` - Invoked with the entry each navigation lands on
    ///
    /// # Returns
    ///
    /// The guard keeping the subscription alive.
    fn listen(&self, callback: Rc<NavigateCallback>) -> HistoryListener;
}

/// Guard returned by [`History::listen`]; the subscription ends when it is
/// dropped.
#[must_use = "dropping the listener unsubscribes it immediately"]
pub struct HistoryListener {
    _callback: Rc<NavigateCallback>,
}

impl HistoryListener {
    /// Wraps the strong reference that keeps a subscription alive.
    ///
    /// Backends call this after storing a [`Weak`](std::rc::Weak) to the same
    /// callback in their listener registry.
    pub fn new(callback: Rc<NavigateCallback>) -> Self {
        Self {
            _callback: callback,
        }
    }
}

impl std::fmt::Debug for HistoryListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryListener").finish_non_exhaustive()
    }
}
