//! Tagged rows
//!
//! One row is one record of tagged server output: an ordered mapping of
//! string keys to text or opaque byte values.

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single value in a tagged row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Text value (the common case)
    Text(String),

    /// Opaque bytes (file content, digests in binary form, ...)
    Bytes(Bytes),
}

impl Value {
    /// Borrow the value as text, if it is text or valid UTF-8 bytes
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }

    /// Text rendering of the value, replacing invalid UTF-8
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Raw bytes of the value
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Value::Text(s) => s.as_bytes(),
            Value::Bytes(b) => b,
        }
    }

    /// True if the value holds no characters/bytes
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Text(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.iter().all(|c| c.is_ascii_whitespace()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

/// One record of tagged output
///
/// Keys keep their insertion order. Inserting an existing key replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` fields
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a field as text
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate an indexed field family (`base0`, `base1`, ...)
    ///
    /// Stops at the first missing index; later indices are never consulted.
    pub fn indexed<'a>(&'a self, base: &'a str) -> IndexedField<'a> {
        IndexedField {
            row: self,
            base,
            next: 0,
            done: false,
        }
    }

    /// Field `base<index>`
    pub fn get_indexed(&self, base: &str, index: usize) -> Option<&Value> {
        self.get(&indexed_key(base, index))
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Key of the `index`-th member of an indexed field family
pub fn indexed_key(base: &str, index: usize) -> String {
    format!("{}{}", base, index)
}

/// Lazy iterator over `base0`, `base1`, ... of one row
///
/// Yields `(index, value)` pairs and terminates at the first gap.
#[derive(Debug, Clone)]
pub struct IndexedField<'a> {
    row: &'a Row,
    base: &'a str,
    next: usize,
    done: bool,
}

impl<'a> Iterator for IndexedField<'a> {
    type Item = (usize, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.row.get_indexed(self.base, self.next) {
            Some(value) => {
                let index = self.next;
                self.next += 1;
                Some((index, value))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for IndexedField<'_> {}
