//! In-memory history backend.
//!
//! A plain entry stack with a cursor, behaving like a browser session
//! history: pushing while somewhere in the middle discards every entry ahead
//! of the cursor, moving past either end is a silent no-op, and every
//! navigation notifies listeners synchronously with the entry it landed on.
//!
//! This is the backend the test suite runs against, and it is suitable for
//! any non-browser host that wants deterministic, process-local navigation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::history::{EntryPayload, History, HistoryListener, Location, NavigateCallback};

/// Navigable in-memory history stack.
///
/// Cloning is shallow: clones share the same entries, cursor, and listener
/// registry, so a history can be handed to several synchronizers at once.
#[derive(Clone)]
pub struct MemoryHistory {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    entries: Vec<Location>,
    index: usize,
    listeners: Vec<Weak<NavigateCallback>>,
}

impl MemoryHistory {
    /// Creates a history whose single entry is `/`.
    pub fn new() -> Self {
        Self::with_url("/")
    }

    /// Creates a history whose single entry is the given URL.
    pub fn with_url(url: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: vec![Location::parse(url)],
                index: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Moves the cursor by `delta` entries and notifies listeners.
    ///
    /// A zero delta, or a move that would leave the stack, is a silent
    /// no-op, matching a browser asked to go past either end of its
    /// session history.
    pub fn go(&self, delta: isize) {
        {
            let mut inner = self.inner.borrow_mut();
            let target = match inner.index.checked_add_signed(delta) {
                Some(target) if delta != 0 && target < inner.entries.len() => target,
                _ => {
                    debug!(delta, "ignoring go outside the stack");
                    return;
                }
            };
            inner.index = target;
            debug!(index = inner.index, "moved by delta");
        }
        self.notify();
    }

    /// Moves one entry forward, if a forward entry exists.
    ///
    /// Not part of the [`History`] port; the synchronizers never navigate
    /// forward themselves. It exists so tests and hosts can replay the
    /// forward half of a back/forward round trip.
    pub fn go_forward(&self) {
        self.go(1);
    }

    /// Number of entries currently on the stack.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Always `false`: a history holds at least its initial entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Position of the current entry, starting at zero.
    pub fn index(&self) -> usize {
        self.inner.borrow().index
    }

    /// Invokes every live listener with the current entry.
    ///
    /// The borrow on the stack is released before any callback runs, so
    /// listeners are free to navigate or subscribe re-entrantly. The entry is
    /// re-read per delivery: when a callback navigates, the callbacks after
    /// it must observe where the stack actually is, not where this
    /// navigation originally landed. Dead weak references are pruned on the
    /// way.
    fn notify(&self) {
        let callbacks: Vec<Rc<NavigateCallback>> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|weak| weak.strong_count() > 0);
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in callbacks {
            let location = {
                let inner = self.inner.borrow();
                inner.entries[inner.index].clone()
            };
            callback(&location);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let inner = self.inner.borrow();
        inner.entries[inner.index].clone()
    }

    fn push(&self, path: &str, payload: Option<EntryPayload>) {
        {
            let mut inner = self.inner.borrow_mut();
            let mut location = Location::parse(path);
            location.state = payload;
            let keep = inner.index + 1;
            inner.entries.truncate(keep);
            inner.entries.push(location);
            inner.index = inner.entries.len() - 1;
            debug!(path = %path, index = inner.index, "pushed history entry");
        }
        self.notify();
    }

    fn replace(&self, path: &str, payload: Option<EntryPayload>) {
        {
            let mut inner = self.inner.borrow_mut();
            let mut location = Location::parse(path);
            location.state = payload;
            let index = inner.index;
            inner.entries[index] = location;
            debug!(path = %path, index, "replaced current history entry");
        }
        self.notify();
    }

    fn go_back(&self) {
        self.go(-1);
    }

    fn listen(&self, callback: Rc<NavigateCallback>) -> HistoryListener {
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&callback));
        HistoryListener::new(callback)
    }
}
