// Configuration Source Port
// Flat, dotted property keys (e.g. `interpreter.python.timeout`)

use std::collections::BTreeMap;

/// Read-only access to application properties
pub trait ConfigSource: Send + Sync {
    /// Value for a full property key
    fn get_property(&self, key: &str) -> Option<String>;

    /// Every known property key (used for prefix filtering)
    fn property_names(&self) -> Vec<String>;
}

/// In-memory property table
///
/// The daemon flattens its layered configuration into this; tests build it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap(BTreeMap<String, String>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ConfigSource for PropertyMap {
    fn get_property(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}
