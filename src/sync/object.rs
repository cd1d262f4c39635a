//! Object-state synchronizer.
//!
//! Keeps a state object, the current history entry, and the URL query string
//! consistent with each other. Explicit updates flow out through the history
//! port as push or replace navigations; back and forward navigation flows
//! back in through the history listener. Both directions meet at a single
//! committed-state cell, which is what makes a synchronizer recognize the
//! echo of its own navigation and ignore it.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, debug_span};

use crate::domain::{StateObject, Update};
use crate::focus::FocusTarget;
use crate::history::{EntryPayload, History, HistoryListener, Location};
use crate::query::{self, QueryMap};
use crate::sync::path;

/// Decoder turning a parsed query into state values.
///
/// Whatever it returns is merged over the initial state, so it only needs to
/// produce the fields actually present in the URL.
pub type DecodeFn = dyn Fn(&QueryMap) -> StateObject;

/// Callback invoked with the new state after every committed change.
pub type StateChangeFn = dyn Fn(&StateObject);

/// Construction options for [`UrlState`].
#[derive(Clone, Default)]
pub struct UrlStateOptions {
    /// Decoder for URL-borne values. Defaults to
    /// [`query::to_state_object`](crate::query::to_state_object), which
    /// yields plain strings and arrays of strings.
    pub decode: Option<Rc<DecodeFn>>,

    /// Where to move focus when external navigation lands on an atomic-only
    /// change. `None` disables focus handling.
    pub focus: Option<Rc<dyn FocusTarget>>,

    /// Fields whose changes replace the current entry instead of pushing a
    /// new one, and never move focus. Think live text input.
    pub non_atomic: BTreeSet<String>,

    /// Key identifying this instance on shared navigation payloads. Defaults
    /// to the path the synchronizer was constructed on.
    pub key: Option<String>,

    /// Invoked once per committed state change, from either direction.
    pub on_change: Option<Rc<StateChangeFn>>,
}

/// A state object mirrored into the URL query string through a navigable
/// history.
///
/// On construction the synchronizer adopts the URL: values decoded from the
/// current query override the initial state. From then on every accepted
/// update rewrites the URL, keeping it minimal (fields equal to their
/// initial value are omitted), and every external navigation is decoded back
/// into state. Changes to atomic fields push a new history entry so the back
/// button can retrace them; changes confined to non-atomic fields replace
/// the current entry so typing does not flood the stack.
///
/// The history subscription ends when the synchronizer is dropped.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use std::rc::Rc;
///
/// use serde_json::json;
/// use urlstate::{History, MemoryHistory, UrlState, UrlStateOptions};
///
/// let history = Rc::new(MemoryHistory::with_url("/inbox"));
///
/// let mut initial = urlstate::StateObject::new();
/// initial.insert("page".into(), json!("1"));
/// initial.insert("q".into(), json!(""));
///
/// let filters = UrlState::new(
///     Rc::clone(&history) as Rc<dyn History>,
///     initial,
///     UrlStateOptions {
///         non_atomic: BTreeSet::from(["q".to_owned()]),
///         ..Default::default()
///     },
/// );
///
/// // An atomic change pushes a new entry with a minimal query.
/// let mut next = filters.get();
/// next.insert("page".into(), json!("2"));
/// filters.set(next);
/// assert_eq!(history.location().url(), "/inbox?page=2");
///
/// // The back button restores the previous state.
/// history.go_back();
/// assert_eq!(filters.get().get("page"), Some(&json!("1")));
/// ```
pub struct UrlState {
    inner: Rc<Inner>,
    _listener: HistoryListener,
}

struct Inner {
    history: Rc<dyn History>,
    initial: StateObject,
    key: String,
    non_atomic: BTreeSet<String>,
    decode: Rc<DecodeFn>,
    focus: Option<Rc<dyn FocusTarget>>,
    on_change: Option<Rc<StateChangeFn>>,
    /// Last committed state, the sole baseline for every duplicate check.
    previous: RefCell<StateObject>,
}

impl UrlState {
    /// Mounts a synchronizer on the history's current entry.
    ///
    /// The starting state is `initial` overridden by whatever the decoder
    /// finds in the current query string. Mounting itself never navigates.
    ///
    /// # Parameters
    ///
    /// * `history` - The navigable history to synchronize with
    /// * `initial` - Default value per field; fields at their default stay
    ///   out of the URL
    /// * `options` - Decoder, focus target, atomicity split, and key
    pub fn new(history: Rc<dyn History>, initial: StateObject, options: UrlStateOptions) -> Self {
        let location = history.location();
        let key = options.key.unwrap_or_else(|| location.path.clone());
        let decode: Rc<DecodeFn> = options
            .decode
            .unwrap_or_else(|| Rc::new(query::to_state_object));

        let mut state = initial.clone();
        for (field, value) in decode(&query::parse(&location.search)) {
            state.insert(field, value);
        }
        debug!(key = %key, path = %location.path, "mounted object-state synchronizer");

        let inner = Rc::new(Inner {
            history: Rc::clone(&history),
            initial,
            key,
            non_atomic: options.non_atomic,
            decode,
            focus: options.focus,
            on_change: options.on_change,
            previous: RefCell::new(state),
        });

        let listener_inner = Rc::clone(&inner);
        let listener = history.listen(Rc::new(move |location: &Location| {
            listener_inner.handle_navigation(location);
        }));

        Self {
            inner,
            _listener: listener,
        }
    }

    /// Returns the last committed state.
    pub fn get(&self) -> StateObject {
        self.inner.previous.borrow().clone()
    }

    /// The key this instance writes on its navigation payloads.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Replaces the state with `next`, navigating accordingly.
    ///
    /// Setting a value equal to the current state is a no-op.
    ///
    /// # Returns
    ///
    /// `true` when the transition was applied, `false` when it was skipped
    /// as a duplicate.
    pub fn set(&self, next: StateObject) -> bool {
        self.inner.transition(next)
    }

    /// Derives the next state from the current one and applies it.
    ///
    /// The closure always receives the last committed state, never a stale
    /// snapshot held by the caller.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&StateObject) -> StateObject,
    {
        let current = self.inner.previous.borrow().clone();
        self.inner.transition(f(&current))
    }

    /// Applies an [`Update`], resolving a closure variant against the last
    /// committed state first.
    pub fn apply(&self, update: Update) -> bool {
        let current = self.inner.previous.borrow().clone();
        let next = update.resolve(&current);
        self.inner.transition(next)
    }
}

impl Inner {
    /// Explicit-update path: classify, build the path, commit, navigate.
    fn transition(&self, next: StateObject) -> bool {
        let _span = debug_span!("transition", key = %self.key).entered();

        let previous = self.previous.borrow().clone();
        if previous == next {
            debug!("state unchanged, skipping navigation");
            return false;
        }

        let atomic_changed = !path::atomic_slice_equal(&previous, &next, &self.non_atomic);
        let location = self.history.location();
        let next_path = path::next_object_path(&location, &next, &self.initial);

        // Committed before navigating: the navigation below fans out
        // synchronously and the listener must already see this value to
        // recognize the event as our own.
        *self.previous.borrow_mut() = next.clone();

        let payload = EntryPayload::new(self.key.clone(), Value::Object(next.clone()));
        if atomic_changed {
            debug!(path = %next_path, "atomic change, pushing history entry");
            self.history.push(&next_path, Some(payload));
        } else {
            debug!(path = %next_path, "non-atomic change, replacing current entry");
            self.history.replace(&next_path, Some(payload));
        }

        // A listener can supersede this transition by navigating during the
        // fan-out; the listener path adopts and reports that state itself.
        if *self.previous.borrow() == next {
            if let Some(on_change) = &self.on_change {
                on_change(&next);
            }
        }
        true
    }

    /// Listener path: derive the navigated-to state, then adopt it unless it
    /// is our own echo or another instance's entry.
    fn handle_navigation(&self, location: &Location) {
        let new_state = match &location.state {
            Some(payload) if payload.key == self.key => match payload.new_state.as_object() {
                Some(state) => state.clone(),
                // A matching key with a non-object payload cannot be ours.
                None => return,
            },
            Some(_) => return,
            None => self.decode_location(&location.search),
        };

        let only_atomic = {
            let previous = self.previous.borrow();
            if *previous == new_state {
                return;
            }
            path::non_atomic_slice_equal(&previous, &new_state, &self.non_atomic)
        };

        debug!(key = %self.key, only_atomic, "adopting externally navigated state");
        if only_atomic {
            if let Some(focus) = &self.focus {
                focus.request_focus();
            }
        }

        *self.previous.borrow_mut() = new_state.clone();
        if let Some(on_change) = &self.on_change {
            on_change(&new_state);
        }
    }

    /// Fresh decode of a query string, merged over the initial state.
    fn decode_location(&self, search: &str) -> StateObject {
        let mut state = self.initial.clone();
        for (field, value) in (self.decode)(&query::parse(search)) {
            state.insert(field, value);
        }
        state
    }
}
