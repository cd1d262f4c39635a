//! Locations and the payload attached to navigation entries.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload attached to a pushed or replaced history entry.
///
/// Several synchronizers can share one history stack, so every entry records
/// which instance wrote it. A listener whose key does not match the payload
/// treats the entry as someone else's navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Key of the synchronizer instance that committed this entry.
    pub key: String,
    /// The state that instance committed alongside the navigation.
    pub new_state: Value,
}

impl EntryPayload {
    /// Builds a payload for the given synchronizer key.
    pub fn new(key: impl Into<String>, new_state: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            new_state: new_state.into(),
        }
    }
}

/// One entry of the navigable history: a URL split into its parts plus the
/// optional payload recorded when the entry was created.
///
/// `search` and `hash` are stored without their `?` and `#` prefixes; an
/// absent component is the empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Path portion of the URL, up to the first `?` or `#`.
    pub path: String,
    /// Query string without the leading `?`.
    pub search: String,
    /// Fragment without the leading `#`.
    pub hash: String,
    /// Payload attached when this entry was pushed or replaced, if any.
    pub state: Option<EntryPayload>,
}

impl Location {
    /// Splits a relative URL into path, search, and hash.
    ///
    /// The fragment is taken first (everything after the first `#`), then the
    /// query (everything after the first `?` of the remainder), matching how
    /// browsers slice `location`. No payload is attached; navigation calls
    /// set [`Location::state`] themselves.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.split_once('#') {
            Some((rest, hash)) => (rest, hash),
            None => (url, ""),
        };
        let (path, search) = match rest.split_once('?') {
            Some((path, search)) => (path, search),
            None => (rest, ""),
        };
        Self {
            path: path.to_owned(),
            search: search.to_owned(),
            hash: hash.to_owned(),
            state: None,
        }
    }

    /// Reassembles the URL string, omitting empty components.
    pub fn url(&self) -> String {
        let mut url = self.path.clone();
        if !self.search.is_empty() {
            url.push('?');
            url.push_str(&self.search);
        }
        if !self.hash.is_empty() {
            url.push('#');
            url.push_str(&self.hash);
        }
        url
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_components() {
        let location = Location::parse("/inbox?page=2&q=rust#results");
        assert_eq!(location.path, "/inbox");
        assert_eq!(location.search, "page=2&q=rust");
        assert_eq!(location.hash, "results");
        assert_eq!(location.state, None);
    }

    #[test]
    fn parses_path_only() {
        let location = Location::parse("/inbox");
        assert_eq!(location.path, "/inbox");
        assert_eq!(location.search, "");
        assert_eq!(location.hash, "");
    }

    #[test]
    fn hash_is_split_before_search() {
        // A '?' inside the fragment belongs to the fragment.
        let location = Location::parse("/a#frag?not-a-query");
        assert_eq!(location.path, "/a");
        assert_eq!(location.search, "");
        assert_eq!(location.hash, "frag?not-a-query");
    }

    #[test]
    fn url_round_trips_and_omits_empty_parts() {
        for url in ["/inbox?page=2#top", "/inbox?page=2", "/inbox#top", "/inbox"] {
            assert_eq!(Location::parse(url).url(), url);
        }
    }

    #[test]
    fn payload_records_key_and_state() {
        let payload = EntryPayload::new("filters", json!({ "page": 2 }));
        assert_eq!(payload.key, "filters");
        assert_eq!(payload.new_state, json!({ "page": 2 }));
    }
}
