//! Test doubles shared by the synchronizer tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::focus::FocusTarget;
use crate::history::{
    EntryPayload, History, HistoryListener, Location, MemoryHistory, NavigateCallback,
};

/// In-memory history that counts every navigation call it receives.
pub(crate) struct CountingHistory {
    inner: MemoryHistory,
    pub(crate) pushes: Cell<usize>,
    pub(crate) replaces: Cell<usize>,
    pub(crate) go_backs: Cell<usize>,
}

impl CountingHistory {
    pub(crate) fn with_url(url: &str) -> Rc<Self> {
        Rc::new(Self {
            inner: MemoryHistory::with_url(url),
            pushes: Cell::new(0),
            replaces: Cell::new(0),
            go_backs: Cell::new(0),
        })
    }

    /// The wrapped stack, for direct navigation and inspection.
    pub(crate) fn memory(&self) -> &MemoryHistory {
        &self.inner
    }
}

impl History for CountingHistory {
    fn location(&self) -> Location {
        self.inner.location()
    }

    fn push(&self, path: &str, payload: Option<EntryPayload>) {
        self.pushes.set(self.pushes.get() + 1);
        self.inner.push(path, payload);
    }

    fn replace(&self, path: &str, payload: Option<EntryPayload>) {
        self.replaces.set(self.replaces.get() + 1);
        self.inner.replace(path, payload);
    }

    fn go_back(&self) {
        self.go_backs.set(self.go_backs.get() + 1);
        self.inner.go_back();
    }

    fn listen(&self, callback: Rc<NavigateCallback>) -> HistoryListener {
        self.inner.listen(callback)
    }
}

/// Focus target that counts requests.
#[derive(Default)]
pub(crate) struct FocusSpy {
    pub(crate) calls: Cell<usize>,
}

impl FocusSpy {
    pub(crate) fn install() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl FocusTarget for FocusSpy {
    fn request_focus(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}
