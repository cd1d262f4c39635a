//! The synchronizers.
//!
//! [`UrlState`] mirrors a whole state object into the query string and
//! decides per transition between push and replace. [`UrlToggle`] mirrors a
//! single boolean parameter, gated by a precondition and collapsing its
//! open/close pair into one history entry. Both talk exclusively to the
//! [`History`](crate::history::History) port.

pub mod object;
mod path;
pub mod toggle;

#[cfg(test)]
mod spy;

pub use object::{DecodeFn, StateChangeFn, UrlState, UrlStateOptions};
pub use toggle::{ToggleChangeFn, UrlToggle, UrlToggleOptions};
