// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Call metadata
//!
//! String key/value pairs attached to a call. Keys are case-insensitive and
//! stored lowercased; inserting an existing key replaces its value.

use std::collections::HashMap;
use std::collections::hash_map;

use opentelemetry::propagation::{Extractor, Injector};

/// Metadata for RPC calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    inner: HashMap<String, String>,
}

impl Metadata {
    /// Create a new empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata from a HashMap. Keys that collide once lowercased
    /// are resolved by byte order of the original key: the greatest wins,
    /// so `foo` beats `Foo`.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut entries: Vec<(String, String)> = map.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut metadata = Self::new();
        metadata.extend(entries);
        metadata
    }

    /// Insert a key-value pair, returning the previous value
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.inner
            .insert(key.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Remove a key-value pair
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(&key.to_ascii_lowercase())
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.inner.iter()
    }

    /// Merge another metadata into this one; `other` wins on conflicts
    pub fn merge(&mut self, other: Metadata) {
        self.inner.extend(other.inner);
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.inner
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.inner
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for Metadata {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut metadata = Metadata::new();
        metadata.extend(iter);
        metadata
    }
}

impl From<HashMap<String, String>> for Metadata {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_map(map)
    }
}

impl IntoIterator for Metadata {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl Extractor for Metadata {
    fn get(&self, key: &str) -> Option<&str> {
        Metadata::get(self, key)
    }

    fn keys(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).collect()
    }
}

impl Injector for Metadata {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key, value);
    }
}
