//! Query-string encoding and decoding.
//!
//! The codec is the only place where percent-encoding is applied or removed.
//! Everything above it works on [`QueryMap`]s, so state comparisons never see
//! encoded text and encoding is never applied twice.
//!
//! Parsing follows `application/x-www-form-urlencoded` semantics: pairs are
//! split on `&`, keys and values are percent-decoded, and a key that appears
//! more than once collects into [`QueryValue::Many`] in order of appearance.
//! Serialization walks the map in key order, which keeps the produced string
//! deterministic for any given map.

use std::collections::BTreeMap;

use serde_json::Value;
use url::form_urlencoded;

/// A decoded query string: field name to decoded value, ordered by key.
pub type QueryMap = BTreeMap<String, QueryValue>;

/// A decoded query-string value.
///
/// Most fields carry a single value. A key repeated in the query string
/// (`tag=a&tag=b`) collects every occurrence instead of silently keeping the
/// last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// The key appeared exactly once.
    One(String),
    /// The key appeared multiple times, in query-string order.
    Many(Vec<String>),
}

impl QueryValue {
    /// Returns the value as a single string, or `None` for a repeated key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::One(value) => Some(value),
            QueryValue::Many(_) => None,
        }
    }

    /// Returns every occurrence of the key, in query-string order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            QueryValue::One(value) => std::slice::from_ref(value),
            QueryValue::Many(values) => values,
        }
    }

    /// Converts a JSON value into its query-string form.
    ///
    /// Scalars serialize the way they print in a URL: strings as themselves,
    /// numbers and booleans via their canonical text, `null` as the empty
    /// string. Arrays become repeated keys with each element converted the
    /// same way. Nested objects have no query-string shape and fall back to
    /// their compact JSON text.
    pub fn from_json(value: &Value) -> QueryValue {
        match value {
            Value::Array(items) => {
                QueryValue::Many(items.iter().map(Self::scalar_text).collect())
            }
            other => QueryValue::One(Self::scalar_text(other)),
        }
    }

    fn scalar_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            nested => nested.to_string(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Many(vec![first, value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::One(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::One(value.to_owned())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values)
    }
}

/// Parses a query string into a [`QueryMap`].
///
/// Accepts the string with or without its leading `?`. Pairs with an empty
/// key (stray `&&`, trailing `&`) are skipped; a key without `=` decodes to
/// the empty string.
///
/// # Parameters
///
/// * `search` - The raw query-string portion of a URL
///
/// # Returns
///
/// The decoded map, empty when the input carries no pairs.
pub fn parse(search: &str) -> QueryMap {
    let raw = search.strip_prefix('?').unwrap_or(search);
    let mut query = QueryMap::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        match query.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                query.insert(key.into_owned(), QueryValue::One(value.into_owned()));
            }
        }
    }
    query
}

/// Serializes a [`QueryMap`] back into a query string.
///
/// The output carries no leading `?`. Keys are written in map order and a
/// [`QueryValue::Many`] value is written as one pair per occurrence, so
/// parsing the result yields the input map again.
///
/// # Parameters
///
/// * `query` - The map to serialize
///
/// # Returns
///
/// The encoded query string, empty for an empty map.
pub fn stringify(query: &QueryMap) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        for occurrence in value.as_slice() {
            serializer.append_pair(key, occurrence);
        }
    }
    serializer.finish()
}

/// Converts a parsed query into a [`StateObject`] of plain strings.
///
/// This is the default decoder for the object-state synchronizer: single
/// values become JSON strings and repeated keys become arrays of strings.
/// Hosts that need typed fields supply their own decoder instead.
///
/// [`StateObject`]: crate::StateObject
pub fn to_state_object(query: &QueryMap) -> crate::StateObject {
    let mut state = crate::StateObject::new();
    for (key, value) in query {
        let json = match value {
            QueryValue::One(v) => Value::String(v.clone()),
            QueryValue::Many(vs) => {
                Value::Array(vs.iter().cloned().map(Value::String).collect())
            }
        };
        state.insert(key.clone(), json);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_simple_pairs() {
        let query = parse("page=2&q=rust");
        assert_eq!(query.get("page"), Some(&QueryValue::One("2".into())));
        assert_eq!(query.get("q"), Some(&QueryValue::One("rust".into())));
    }

    #[test]
    fn leading_question_mark_is_optional() {
        assert_eq!(parse("?a=1"), parse("a=1"));
    }

    #[test]
    fn repeated_keys_collect_in_order() {
        let query = parse("tag=a&tag=b&tag=c");
        assert_eq!(
            query.get("tag"),
            Some(&QueryValue::Many(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn empty_and_missing_values_decode_to_empty_strings() {
        let query = parse("q=&flag");
        assert_eq!(query.get("q"), Some(&QueryValue::One(String::new())));
        assert_eq!(query.get("flag"), Some(&QueryValue::One(String::new())));
    }

    #[test]
    fn stray_separators_are_skipped() {
        let query = parse("a=1&&b=2&");
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn percent_encoding_round_trips() {
        let mut query = QueryMap::new();
        query.insert("q".into(), QueryValue::One("a b&c=d".into()));
        query.insert("path".into(), QueryValue::One("/inbox?x".into()));

        let encoded = stringify(&query);
        assert!(!encoded.contains("a b"));
        assert_eq!(parse(&encoded), query);
    }

    #[test]
    fn stringify_is_deterministic_and_sorted() {
        let mut query = QueryMap::new();
        query.insert("z".into(), "26".into());
        query.insert("a".into(), "1".into());
        assert_eq!(stringify(&query), "a=1&z=26");
    }

    #[test]
    fn many_values_repeat_the_key() {
        let mut query = QueryMap::new();
        query.insert("tag".into(), vec!["a".to_owned(), "b".to_owned()].into());
        assert_eq!(stringify(&query), "tag=a&tag=b");
    }

    #[test]
    fn empty_map_serializes_to_empty_string() {
        assert_eq!(stringify(&QueryMap::new()), "");
    }

    #[test]
    fn json_scalars_convert_to_query_text() {
        assert_eq!(
            QueryValue::from_json(&json!("inbox")),
            QueryValue::One("inbox".into())
        );
        assert_eq!(QueryValue::from_json(&json!(7)), QueryValue::One("7".into()));
        assert_eq!(
            QueryValue::from_json(&json!(true)),
            QueryValue::One("true".into())
        );
        assert_eq!(QueryValue::from_json(&json!(null)), QueryValue::One("".into()));
    }

    #[test]
    fn json_arrays_convert_to_many() {
        assert_eq!(
            QueryValue::from_json(&json!(["a", 2])),
            QueryValue::Many(vec!["a".into(), "2".into()])
        );
    }

    #[test]
    fn default_decoder_produces_strings_and_arrays() {
        let query = parse("q=rust&tag=a&tag=b");
        let state = to_state_object(&query);
        assert_eq!(state.get("q"), Some(&json!("rust")));
        assert_eq!(state.get("tag"), Some(&json!(["a", "b"])));
    }
}
