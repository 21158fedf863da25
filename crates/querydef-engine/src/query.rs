//! Raw query input and the thin edges toward URI land.
//!
//! The URI parser and constructor proper are external collaborators;
//! this module carries only what the core needs: the key→values
//! multimap handed to `Registry::process`, the canonical `k=v&k=v`
//! join, and query-component replacement for `make_uri`.  No percent
//! encoding or decoding happens here; that is the caller's concern.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw input: parameter name to ordered list of string atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    entries: BTreeMap<String, Vec<String>>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a query string on `&` and the first `=` of each pair.
    /// A bare key contributes a single empty atom; empty segments are
    /// skipped.
    pub fn parse(input: &str) -> Self {
        let mut query = Self::new();
        for segment in input.split('&') {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => query.push(key, value),
                None => query.push(segment, ""),
            };
        }
        query
    }

    /// Append one atom under `key`.
    pub fn push(&mut self, key: impl Into<String>, atom: impl Into<String>) -> &mut Self {
        self.entries
            .entry(key.into())
            .or_default()
            .push(atom.into());
        self
    }

    /// Replace the atom list under `key`.
    pub fn insert_list<I, S>(&mut self, key: impl Into<String>, atoms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(key.into(), atoms.into_iter().map(Into::into).collect());
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for RawQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut query = Self::new();
        for (key, value) in pairs {
            query.push(key, value);
        }
        query
    }
}

/// Canonical `k=v&k=v` join for one key's formatted atoms.
pub fn join_pairs(key: &str, atoms: &[String]) -> String {
    atoms
        .iter()
        .map(|atom| format!("{key}={atom}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Replace the query component of a URI string, preserving the
/// fragment.  An empty query removes the `?` entirely.
pub fn replace_query(uri: &str, query: &str) -> String {
    let (head, fragment) = match uri.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (uri, None),
    };
    let base = head.split_once('?').map_or(head, |(base, _)| base);

    let mut out = String::with_capacity(base.len() + query.len() + 2);
    out.push_str(base);
    if !query.is_empty() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_equals_only() {
        let q = RawQuery::parse("a=1&b=x=y");
        assert_eq!(q.get("a"), Some(&["1".to_string()][..]));
        assert_eq!(q.get("b"), Some(&["x=y".to_string()][..]));
    }

    #[test]
    fn parse_repeated_keys_accumulate_in_order() {
        let q = RawQuery::parse("k=1&k=2&k=3");
        assert_eq!(
            q.get("k"),
            Some(&["1".to_string(), "2".to_string(), "3".to_string()][..])
        );
    }

    #[test]
    fn parse_bare_key_is_an_empty_atom() {
        let q = RawQuery::parse("flag&k=v");
        assert_eq!(q.get("flag"), Some(&[String::new()][..]));
    }

    #[test]
    fn parse_empty_input_is_empty() {
        assert!(RawQuery::parse("").is_empty());
        assert!(RawQuery::parse("&&").is_empty());
    }

    #[test]
    fn join_pairs_repeats_the_key() {
        assert_eq!(
            join_pairs("k", &["a".into(), "b".into()]),
            "k=a&k=b"
        );
        assert_eq!(join_pairs("k", &[]), "");
    }

    #[test]
    fn replace_query_handles_all_shapes() {
        assert_eq!(
            replace_query("https://h/p?a=1", "b=2"),
            "https://h/p?b=2"
        );
        assert_eq!(replace_query("https://h/p", "b=2"), "https://h/p?b=2");
        assert_eq!(
            replace_query("https://h/p?a=1#frag", "b=2"),
            "https://h/p?b=2#frag"
        );
        assert_eq!(replace_query("https://h/p?a=1#frag", ""), "https://h/p#frag");
    }

    #[test]
    fn from_iterator_collects_pairs() {
        let q: RawQuery = [("a", "1"), ("a", "2"), ("b", "x")].into_iter().collect();
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("a"), Some(&["1".to_string(), "2".to_string()][..]));
    }

    #[test]
    fn serde_round_trip() {
        let q = RawQuery::parse("a=1&b=2");
        let json = serde_json::to_string(&q).expect("serialize");
        let back: RawQuery = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(q, back);
    }
}
