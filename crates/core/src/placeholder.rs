//! `{{KEY}}` placeholder substitution.
//!
//! Substitution is single-pass: text coming from a value is never scanned
//! again, and placeholders with no matching key are left untouched.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex matching a `{{KEY}}` placeholder and capturing the key.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// Values keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    values: BTreeMap<String, String>,
}

impl PlaceholderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text for `key`. The value is stored in Unicode NFC.
    pub fn insert(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        self.values
            .insert(key.into(), value.as_ref().nfc().collect());
    }

    /// Text for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every known `{{KEY}}` in `text`.
    ///
    /// Returns `Cow::Borrowed` when nothing was replaced, so callers can skip
    /// rewriting untouched text.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains("{{") {
            return Cow::Borrowed(text);
        }

        let mut replaced = false;
        let result = PLACEHOLDER_REGEX.replace_all(text, |caps: &Captures| {
            match self.values.get(&caps[1]) {
                Some(value) => {
                    replaced = true;
                    value.clone()
                }
                None => caps[0].to_string(),
            }
        });

        if replaced {
            Cow::Owned(result.into_owned())
        } else {
            Cow::Borrowed(text)
        }
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Distinct placeholder keys mentioned in `text`, in order of first appearance.
pub fn placeholder_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_REGEX.captures_iter(text) {
        let key = &caps[1];
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}
