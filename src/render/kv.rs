//! Free-form key/value pair editor model.

use indexmap::IndexMap;

use crate::options::stringify;

/// Ordered key/value pairs backing the `key-value-pairs` field type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValuePairs {
    pairs: IndexMap<String, String>,
}

impl KeyValuePairs {
    pub fn from_value(value: &serde_json::Value) -> Self {
        let pairs = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (key.clone(), stringify(value)))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.pairs
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Appends at the end; an existing key keeps its position and takes
    /// the new value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.pairs.shift_remove(key)
    }

    /// Rename a key in place, preserving insertion order and value.
    ///
    /// Renaming onto an existing key merges the two pairs, last write
    /// wins. That matches the observed editor behavior and is kept
    /// deliberately; see DESIGN.md.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) {
        let to = to.into();
        if from == to || !self.pairs.contains_key(from) {
            return;
        }
        let mut next = IndexMap::with_capacity(self.pairs.len());
        for (key, value) in self.pairs.drain(..) {
            if key == from {
                next.insert(to.clone(), value);
            } else {
                next.insert(key, value);
            }
        }
        self.pairs = next;
    }
}
