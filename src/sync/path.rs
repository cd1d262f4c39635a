//! Path building and state-diff helpers shared by both synchronizers.
//!
//! A new path always starts from the query string currently in the URL, so
//! parameters owned by other synchronizers (or by nobody) survive every
//! navigation. Managed fields are then written over it, and any field whose
//! value equals its initial value is omitted. The URL therefore carries only
//! what differs from the defaults.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::domain::StateObject;
use crate::history::Location;
use crate::query::{self, QueryMap, QueryValue};

/// Builds the path for an object-state transition.
///
/// The current query is merged with `next` (state wins), fields value-equal
/// to `initial` are dropped, and path and hash are carried over unchanged. A
/// parameter that exists only in the URL is dropped too when it matches the
/// initial value of the same field, so stale leftovers of a managed field do
/// not linger.
pub(crate) fn next_object_path(
    location: &Location,
    next: &StateObject,
    initial: &StateObject,
) -> String {
    let mut query = query::parse(&location.search);
    query.retain(|key, value| match (initial.get(key), value) {
        (Some(Value::String(expected)), QueryValue::One(actual)) => expected != actual,
        _ => true,
    });
    for (field, value) in next {
        if initial.get(field) == Some(value) {
            query.remove(field);
        } else {
            query.insert(field.clone(), QueryValue::from_json(value));
        }
    }
    compose(&location.path, &query, &location.hash)
}

/// Builds the path for a toggle transition.
///
/// Only the toggle's own parameter is touched: set when the value differs
/// from `initial`, removed when it does not. Every other parameter passes
/// through untouched.
pub(crate) fn next_toggle_path(
    location: &Location,
    name: &str,
    value: bool,
    initial: bool,
) -> String {
    let mut query = query::parse(&location.search);
    if value == initial {
        query.remove(name);
    } else {
        query.insert(name.to_owned(), QueryValue::One(value.to_string()));
    }
    compose(&location.path, &query, &location.hash)
}

fn compose(path: &str, query: &QueryMap, hash: &str) -> String {
    let mut url = path.to_owned();
    let encoded = query::stringify(query);
    if !encoded.is_empty() {
        url.push('?');
        url.push_str(&encoded);
    }
    if !hash.is_empty() {
        url.push('#');
        url.push_str(hash);
    }
    url
}

/// Whether two states agree on every field outside `non_atomic`.
///
/// `false` means some atomic field changed, which makes a transition worth a
/// new history entry.
pub(crate) fn atomic_slice_equal(
    a: &StateObject,
    b: &StateObject,
    non_atomic: &BTreeSet<String>,
) -> bool {
    a.keys()
        .chain(b.keys())
        .filter(|key| !non_atomic.contains(*key))
        .all(|key| a.get(key) == b.get(key))
}

/// Whether two states agree on every field inside `non_atomic`.
///
/// `true` on a changed state means the difference is atomic-only, which is
/// what decides whether external navigation moves focus.
pub(crate) fn non_atomic_slice_equal(
    a: &StateObject,
    b: &StateObject,
    non_atomic: &BTreeSet<String>,
) -> bool {
    non_atomic.iter().all(|key| a.get(key) == b.get(key))
}
