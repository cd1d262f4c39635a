//! Shared value types for synchronizer state.
//!
//! The object-state synchronizer works on plain mappings from field name to
//! JSON-compatible value, mirroring what ends up in the URL query string. This
//! module defines the [`StateObject`] alias for that mapping and the [`Update`]
//! union used to express "set to this value" versus "derive from the previous
//! value" in a single transition argument.

use std::fmt;

use serde_json::Value;

/// A state mapping from field name to JSON-compatible value.
///
/// `serde_json::Map` compares structurally, which is what every duplicate check
/// and atomicity classification in the synchronizer relies on. Field values are
/// ordinary [`serde_json::Value`]s, so anything a query string can round-trip
/// (scalars and arrays of scalars) is representable.
pub type StateObject = serde_json::Map<String, Value>;

/// A pending state transition: either a complete replacement value or a
/// function of the last committed state.
///
/// Updates are resolved exactly once, at the start of the transition, against
/// the synchronizer's last committed value rather than a possibly stale
/// snapshot held by the caller.
///
/// # Examples
///
/// ```
/// use urlstate::{StateObject, Update};
///
/// // A plain value converts directly.
/// let next = StateObject::new();
/// let _update: Update = next.into();
///
/// // A closure derives the next state from the previous one.
/// let _update = Update::with(|previous: &StateObject| previous.clone());
/// ```
pub enum Update {
    /// Replace the state with this exact value.
    Value(StateObject),

    /// Derive the next state from the last committed state.
    With(Box<dyn FnOnce(&StateObject) -> StateObject>),
}

impl Update {
    /// Wraps a derivation closure without the caller spelling out the `Box`.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&StateObject) -> StateObject + 'static,
    {
        Update::With(Box::new(f))
    }

    /// Resolves the update against the last committed state.
    pub(crate) fn resolve(self, current: &StateObject) -> StateObject {
        match self {
            Update::Value(next) => next,
            Update::With(f) => f(current),
        }
    }
}

impl From<StateObject> for Update {
    fn from(value: StateObject) -> Self {
        Update::Value(value)
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Value(state) => f.debug_tuple("Value").field(state).finish(),
            Update::With(_) => f.debug_tuple("With").field(&"<closure>").finish(),
        }
    }
}
