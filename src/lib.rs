//! urlstate: UI-agnostic synchronization of application state with a
//! navigable history stack and its URL query string.
//!
//! The crate keeps an in-memory state object consistent with the browser-style
//! history a host provides:
//! - Mirrors state fields into the URL query string, omitting fields that
//!   equal their initial value
//! - Decides per transition whether a change is worth a new history entry
//!   (push) or should rewrite the current one (replace)
//! - Distinguishes externally-triggered navigation (back/forward) from the
//!   echo of its own navigations
//! - Restores keyboard focus after external navigation, through a pluggable
//!   focus port
//! - Persists values outside the URL through a local store with change
//!   watching
//!
//! # Architecture
//!
//! Everything is built around ports. The synchronizers never touch a global
//! location or a real browser; they talk to traits the host implements, which
//! is also what makes the whole crate testable against an in-memory stack.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host (UI framework, server shell, test harness)    │
//! └─────────────────────────────────────────────────────┘
//!          │ set / update              │ back / forward
//! ┌─────────────────────────────────────────────────────┐
//! │  Synchronizers (sync/)                              │
//! │  - UrlState: object state, push-vs-replace routing  │
//! │  - UrlToggle: single flag, precondition lock,       │
//! │    entry-collapse economy                           │
//! └─────────────────────────────────────────────────────┘
//!      │                  │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Query Codec   │   │ History Port  │   │ Focus Port    │
//! │ (query/)      │   │ (history/)    │   │ (focus/)      │
//! │ - parse       │   │ - push        │   │ - request_    │
//! │ - stringify   │   │ - replace     │   │   focus       │
//! │               │   │ - go_back     │   │               │
//! │               │   │ - listen      │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Store (store/)                                     │  ← Off-URL state
//! │  - StoreBackend port with watch subscriptions       │
//! │  - MemoryStore / FileStore backends                 │
//! │  - Persisted<T> typed handles                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`sync`]: The synchronizers, [`UrlState`] and [`UrlToggle`]
//! - [`history`]: History port, [`Location`], entry payloads, and the
//!   in-memory backend
//! - [`query`]: Query-string codec ([`query::parse`], [`query::stringify`])
//! - [`focus`]: Focus port for post-navigation focus restoration
//! - [`store`]: Local persistence with typed [`store::Persisted`] handles
//! - [`domain`]: Error type, state aliases, the value-or-updater union
//!
//! # Examples
//!
//! ## Object state
//!
//! ```
//! use std::collections::BTreeSet;
//! use std::rc::Rc;
//!
//! use serde_json::json;
//! use urlstate::{History, MemoryHistory, StateObject, UrlState, UrlStateOptions};
//!
//! let history = Rc::new(MemoryHistory::with_url("/search"));
//!
//! let mut initial = StateObject::new();
//! initial.insert("page".into(), json!("1"));
//! initial.insert("q".into(), json!(""));
//!
//! let filters = UrlState::new(
//!     Rc::clone(&history) as Rc<dyn History>,
//!     initial,
//!     UrlStateOptions {
//!         non_atomic: BTreeSet::from(["q".to_owned()]),
//!         ..Default::default()
//!     },
//! );
//!
//! // Typing rewrites the current entry; the query string stays minimal.
//! let mut next = filters.get();
//! next.insert("q".into(), json!("rust"));
//! filters.set(next);
//! assert_eq!(history.location().url(), "/search?q=rust");
//! assert_eq!(history.len(), 1);
//!
//! // A page change is a navigational step worth a back-button stop.
//! let mut next = filters.get();
//! next.insert("page".into(), json!("2"));
//! filters.set(next);
//! assert_eq!(history.location().url(), "/search?page=2&q=rust");
//! assert_eq!(history.len(), 2);
//!
//! // The back button restores the previous state.
//! history.go_back();
//! assert_eq!(filters.get().get("page"), Some(&json!("1")));
//! ```
//!
//! ## Boolean toggle
//!
//! ```
//! use std::rc::Rc;
//!
//! use urlstate::{History, MemoryHistory, UrlToggle, UrlToggleOptions};
//!
//! let history = Rc::new(MemoryHistory::with_url("/mail"));
//! let compose = UrlToggle::new(
//!     Rc::clone(&history) as Rc<dyn History>,
//!     "compose",
//!     false,
//!     UrlToggleOptions::default(),
//! );
//!
//! compose.set(true);
//! assert_eq!(history.location().url(), "/mail?compose=true");
//!
//! // Closing goes back instead of pushing, so the open/close pair
//! // occupies a single history entry.
//! compose.set(false);
//! assert_eq!(history.location().url(), "/mail");
//! assert_eq!(history.index(), 0);
//! ```
//!
//! # Key Design Decisions
//!
//! ## Push versus replace
//!
//! Fields declared non-atomic (live text input) rewrite the current entry;
//! everything else pushes a new one. Atomic changes are meaningful
//! navigational steps, while a keystroke-per-entry history would bury the
//! back button.
//!
//! ## Self-echo suppression
//!
//! Every navigation a synchronizer issues comes straight back through its
//! own history listener. The committed-state cell is updated before the
//! navigation call, so the echo compares equal and is dropped; only genuine
//! external navigation changes state, notifies, or moves focus.
//!
//! ## Ports over globals
//!
//! History, focus, and storage are injected capabilities, not process
//! globals. A host wires them to the real browser surface; tests wire them
//! to [`MemoryHistory`] and [`store::MemoryStore`] and get fully
//! deterministic navigation.
//!
//! ## Minimal URLs
//!
//! A field equal to its initial value is never written into the query
//! string, and a stale URL parameter matching its initial value is dropped
//! on the next transition. URLs stay short, and absent always means
//! "initial".

pub mod domain;
pub mod focus;
pub mod history;
pub mod query;
pub mod store;
pub mod sync;

pub use domain::{Result, StateObject, Update, UrlStateError};
pub use focus::{FocusTarget, NoopFocus};
pub use history::{EntryPayload, History, HistoryListener, Location, MemoryHistory};
pub use sync::{UrlState, UrlStateOptions, UrlToggle, UrlToggleOptions};
