//! Boolean-toggle synchronizer.
//!
//! A single boolean field mirrored into one query parameter, with two
//! behaviors the object variant does not have. A precondition gate locks the
//! toggle at its initial value: explicit attempts to leave it are rejected
//! and navigations that would flip it are reversed with a `go_back`. And the
//! toggle tracks whether it ever pushed an entry itself, so setting the
//! value back to its initial collapses the open/close pair into one history
//! entry instead of stacking a second.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, debug_span};

use crate::history::{EntryPayload, History, HistoryListener, Location};
use crate::query;
use crate::sync::path;

/// Callback invoked with the new value after every committed change.
pub type ToggleChangeFn = dyn Fn(bool);

/// Construction options for [`UrlToggle`].
#[derive(Clone)]
pub struct UrlToggleOptions {
    /// Whether transitions away from the initial value are currently
    /// allowed. Defaults to `true`; an absent gate means a free toggle.
    pub precondition: bool,

    /// Invoked once per committed value change, from either direction.
    pub on_change: Option<Rc<ToggleChangeFn>>,
}

impl Default for UrlToggleOptions {
    fn default() -> Self {
        Self {
            precondition: true,
            on_change: None,
        }
    }
}

/// A boolean mirrored into a single query parameter.
///
/// The parameter is named after the toggle and appears in the URL only while
/// the value differs from its initial; the navigation payload key is the
/// toggle's name. Unlike the object variant, a toggle never ignores foreign
/// navigation payloads: it re-decodes its parameter from whatever URL the
/// navigation landed on, so entries pushed by other synchronizers on the
/// same history keep it in sync too.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use urlstate::{History, MemoryHistory, UrlToggle, UrlToggleOptions};
///
/// let history = Rc::new(MemoryHistory::with_url("/settings"));
/// let panel = UrlToggle::new(
///     Rc::clone(&history) as Rc<dyn History>,
///     "panel",
///     false,
///     UrlToggleOptions::default(),
/// );
///
/// panel.set(true);
/// assert_eq!(history.location().url(), "/settings?panel=true");
///
/// // Closing again collapses the pair back onto the original entry.
/// panel.set(false);
/// assert_eq!(history.location().url(), "/settings");
/// ```
pub struct UrlToggle {
    inner: Rc<Inner>,
    _listener: HistoryListener,
}

struct Inner {
    history: Rc<dyn History>,
    name: String,
    initial: bool,
    precondition: Cell<bool>,
    current: Cell<bool>,
    /// Whether this instance ever pushed an entry itself.
    has_navigated: Cell<bool>,
    on_change: Option<Rc<ToggleChangeFn>>,
}

impl UrlToggle {
    /// Mounts a toggle named `name` on the history's current entry.
    ///
    /// A free toggle adopts the value found in the URL. A locked one starts
    /// at `initial` regardless, and if the URL disagreed it is corrected
    /// once, via `replace`, so the stale parameter does not linger.
    ///
    /// # Parameters
    ///
    /// * `history` - The navigable history to synchronize with
    /// * `name` - Query parameter and payload key for this toggle
    /// * `initial` - Value considered "off"; it is never written to the URL
    /// * `options` - Precondition gate and change callback
    pub fn new(
        history: Rc<dyn History>,
        name: impl Into<String>,
        initial: bool,
        options: UrlToggleOptions,
    ) -> Self {
        let name = name.into();
        let location = history.location();
        let url_value = decode(&location.search, &name, initial);
        let current = if options.precondition {
            url_value
        } else {
            initial
        };
        debug!(name = %name, current, "mounted toggle synchronizer");

        if !options.precondition && url_value != initial {
            let path = path::next_toggle_path(&location, &name, initial, initial);
            debug!(name = %name, path = %path, "clearing locked toggle from the URL");
            history.replace(&path, Some(EntryPayload::new(name.clone(), Value::Bool(initial))));
        }

        let inner = Rc::new(Inner {
            history: Rc::clone(&history),
            name,
            initial,
            precondition: Cell::new(options.precondition),
            current: Cell::new(current),
            has_navigated: Cell::new(false),
            on_change: options.on_change,
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

    /// Returns the current value.
    pub fn get(&self) -> bool {
        self.inner.current.get()
    }

    /// The query parameter and payload key this toggle owns.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Moves the toggle to `value`, navigating accordingly.
    ///
    /// Rejected while the precondition is unmet and `value` differs from the
    /// initial; setting the current value is a no-op. When the toggle
    /// returns to its initial value after having pushed an entry itself, it
    /// goes back instead of pushing again, so opening and closing leaves no
    /// extra entry behind.
    ///
    /// # Returns
    ///
    /// `true` when the transition was applied, `false` when it was rejected
    /// or skipped.
    pub fn set(&self, value: bool) -> bool {
        self.inner.transition(value)
    }

    /// Opens or closes the precondition gate for future transitions.
    ///
    /// The current value is left alone; a toggle that is already away from
    /// its initial value stays there until something navigates.
    pub fn set_precondition(&self, precondition: bool) {
        debug!(name = %self.inner.name, precondition, "toggle precondition changed");
        self.inner.precondition.set(precondition);
    }
}

impl Inner {
    fn transition(&self, value: bool) -> bool {
        let _span = debug_span!("toggle_transition", name = %self.name, value).entered();

        if !self.precondition.get() && value != self.initial {
            debug!("precondition unmet, rejecting transition");
            return false;
        }
        if self.current.get() == value {
            debug!("value unchanged, skipping navigation");
            return false;
        }

        // Committed before navigating, like the object variant: the fan-out
        // below must already see this value to recognize the echo.
        self.current.set(value);

        if value == self.initial && self.has_navigated.get() {
            debug!("returning to initial value, collapsing via go_back");
            self.history.go_back();
        } else {
            let location = self.history.location();
            let path = path::next_toggle_path(&location, &self.name, value, self.initial);
            self.has_navigated.set(true);
            debug!(path = %path, "pushing toggle entry");
            self.history
                .push(&path, Some(EntryPayload::new(self.name.clone(), Value::Bool(value))));
        }

        // The collapse above can land on an entry that disagrees with the
        // committed value; the listener adopts and reports that case itself.
        if self.current.get() == value {
            if let Some(on_change) = &self.on_change {
                on_change(value);
            }
        }
        true
    }

    /// Listener path: every navigation is re-decoded, own or not. The value
    /// is read from a matching payload when one is attached and from the
    /// landed URL otherwise.
    fn handle_navigation(&self, location: &Location) {
        let new_value = match &location.state {
            Some(payload) if payload.key == self.name => payload
                .new_state
                .as_bool()
                .unwrap_or_else(|| decode(&location.search, &self.name, self.initial)),
            _ => decode(&location.search, &self.name, self.initial),
        };

        if !self.precondition.get() && new_value != self.initial {
            debug!(name = %self.name, "locked toggle navigated away from initial, reversing");
            self.history.go_back();
            return;
        }
        if self.current.get() == new_value {
            return;
        }

        debug!(name = %self.name, new_value, "toggle value changed by navigation");
        self.current.set(new_value);
        if let Some(on_change) = &self.on_change {
            on_change(new_value);
        }
    }
}

/// Reads a toggle's value out of a query string.
///
/// An absent parameter means the initial value. A present one is `true`
/// exactly when its single value is the text `true`; repeated parameters
/// never count as `true`.
fn decode(search: &str, name: &str, initial: bool) -> bool {
    match query::parse(search).get(name) {
        None => initial,
        Some(value) => value.as_str() == Some("true"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::spy::CountingHistory;
    use std::cell::RefCell;

    fn free_toggle(history: &Rc<CountingHistory>) -> UrlToggle {
        UrlToggle::new(
            Rc::clone(history) as Rc<dyn History>,
            "panel",
            false,
            UrlToggleOptions::default(),
        )
    }

    fn locked_toggle(history: &Rc<CountingHistory>) -> UrlToggle {
        UrlToggle::new(
            Rc::clone(history) as Rc<dyn History>,
            "panel",
            false,
            UrlToggleOptions {
                precondition: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn mount_adopts_the_url_value() {
        let history = CountingHistory::with_url("/settings?panel=true");
        let toggle = free_toggle(&history);
        assert!(toggle.get());
        assert_eq!(history.replaces.get(), 0);
    }

    #[test]
    fn mount_defaults_to_the_initial_value() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);
        assert!(!toggle.get());
    }

    #[test]
    fn repeated_parameters_never_decode_as_true() {
        let history = CountingHistory::with_url("/settings?panel=true&panel=true");
        let toggle = free_toggle(&history);
        assert!(!toggle.get());
    }

    #[test]
    fn locked_mount_scrubs_the_url() {
        let history = CountingHistory::with_url("/settings?panel=true&theme=dark");
        let toggle = locked_toggle(&history);

        assert!(!toggle.get());
        assert_eq!(history.replaces.get(), 1);
        assert_eq!(history.memory().location().url(), "/settings?theme=dark");
        assert_eq!(
            history.memory().location().state,
            Some(EntryPayload::new("panel", Value::Bool(false)))
        );
    }

    #[test]
    fn open_then_close_collapses_to_one_entry() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);

        assert!(toggle.set(true));
        assert!(toggle.get());
        assert_eq!(history.memory().location().url(), "/settings?panel=true");

        assert!(toggle.set(false));
        assert!(!toggle.get());
        assert_eq!(history.pushes.get(), 1);
        assert_eq!(history.go_backs.get(), 1);
        assert_eq!(history.memory().index(), 0);
        assert_eq!(history.memory().location().url(), "/settings");
    }

    #[test]
    fn reopening_pushes_again() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);

        toggle.set(true);
        toggle.set(false);
        toggle.set(true);

        assert!(toggle.get());
        assert_eq!(history.pushes.get(), 2);
        assert_eq!(history.go_backs.get(), 1);
    }

    #[test]
    fn precondition_rejects_explicit_transitions() {
        let history = CountingHistory::with_url("/settings");
        let toggle = locked_toggle(&history);

        assert!(!toggle.set(true));
        assert!(!toggle.get());
        assert_eq!(history.pushes.get(), 0);
        assert_eq!(history.replaces.get(), 0);
        assert_eq!(history.go_backs.get(), 0);
    }

    #[test]
    fn unlocking_allows_the_transition() {
        let history = CountingHistory::with_url("/settings");
        let toggle = locked_toggle(&history);

        toggle.set_precondition(true);
        assert!(toggle.set(true));
        assert!(toggle.get());
        assert_eq!(history.pushes.get(), 1);
    }

    #[test]
    fn locking_still_allows_returning_to_initial() {
        let history = CountingHistory::with_url("/settings?panel=true");
        let toggle = free_toggle(&history);
        assert!(toggle.get());

        toggle.set_precondition(false);
        assert!(toggle.set(false));
        assert!(!toggle.get());
        // Never pushed itself, so this is a push, not a go_back.
        assert_eq!(history.pushes.get(), 1);
        assert_eq!(history.go_backs.get(), 0);
        assert_eq!(history.memory().location().url(), "/settings");
    }

    #[test]
    fn locked_toggle_reverses_external_navigation() {
        let history = CountingHistory::with_url("/settings");
        let toggle = locked_toggle(&history);

        history.push("/settings?panel=true", None);

        assert!(!toggle.get());
        assert_eq!(history.go_backs.get(), 1);
        assert_eq!(history.memory().index(), 0);
        assert_eq!(history.memory().location().url(), "/settings");
    }

    #[test]
    fn back_button_closes_an_open_toggle() {
        let history = CountingHistory::with_url("/settings");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let toggle = UrlToggle::new(
            Rc::clone(&history) as Rc<dyn History>,
            "panel",
            false,
            UrlToggleOptions {
                on_change: Some(Rc::new(move |value| sink.borrow_mut().push(value))),
                ..Default::default()
            },
        );

        toggle.set(true);
        history.memory().go_back();

        assert!(!toggle.get());
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn setting_the_current_value_navigates_nowhere() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);

        assert!(!toggle.set(false));
        assert_eq!(history.pushes.get(), 0);
        assert_eq!(history.go_backs.get(), 0);
    }

    #[test]
    fn foreign_payloads_fall_through_to_the_url() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);

        // Another synchronizer pushes an entry that happens to carry our
        // parameter; the toggle reads it from the URL.
        history.push(
            "/settings?page=2&panel=true",
            Some(EntryPayload::new("/settings", serde_json::json!({ "page": "2" }))),
        );
        assert!(toggle.get());
    }

    #[test]
    fn unrelated_parameters_survive_toggle_navigation() {
        let history = CountingHistory::with_url("/settings?theme=dark");
        let toggle = free_toggle(&history);

        toggle.set(true);
        assert_eq!(
            history.memory().location().url(),
            "/settings?panel=true&theme=dark"
        );
    }

    #[test]
    fn collapse_at_the_oldest_entry_still_commits_the_value() {
        let history = CountingHistory::with_url("/settings");
        let toggle = free_toggle(&history);

        // Open once so the collapse path is armed, then walk back to the
        // root and flip the flag on via replace, outside the toggle.
        toggle.set(true);
        history.memory().go_back();
        history.replace("/settings?panel=true", None);
        assert!(toggle.get());

        // go_back has nowhere to go; the caller's value must win anyway.
        assert!(toggle.set(false));
        assert!(!toggle.get());
        assert_eq!(history.memory().index(), 0);
    }
}
