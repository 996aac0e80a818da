use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Color, TagValue};

/// Declared appearance and default value of one option key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub color: Color,
    pub value: TagValue,
}

impl Default for OptionSpec {
    fn default() -> Self {
        OptionSpec {
            color: Color::new(0xFF, 0x00, 0xFF),
            value: TagValue::Bool(true),
        }
    }
}

/// The vocabulary of per-cell option tags declared for a map.
///
/// This is the catalog of keys the UI offers (with a display color and a
/// default value each), distinct from the `options` any single cell carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionRegistry {
    entries: BTreeMap<String, OptionSpec>,
}

impl OptionRegistry {
    pub(crate) fn from_entries(entries: BTreeMap<String, OptionSpec>) -> Self {
        OptionRegistry { entries }
    }

    pub fn declare(&mut self, key: impl Into<String>, spec: OptionSpec) {
        self.entries.insert(key.into(), spec);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<OptionSpec> {
        self.entries.remove(key)
    }

    /// Look up a key, falling back to a placeholder spec for undeclared keys.
    pub fn get(&self, key: &str) -> OptionSpec {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionSpec)> {
        self.entries.iter().map(|(key, spec)| (key.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, OptionSpec> {
        &self.entries
    }
}
