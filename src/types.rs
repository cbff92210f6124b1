//! Core types for document sections and metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier for a section within one index.
///
/// Ids are 0-based sequence positions assigned at segmentation time and
/// stable for the lifetime of that index. A re-ingested document gets a
/// fresh id sequence starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(u32);

impl SectionId {
    /// Create a SectionId from its sequence position.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the inner value as u32.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded, independently retrievable span of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Sequence position within the document (0-based).
    pub id: SectionId,

    /// The literal text of the section. Immutable once created.
    pub content: String,

    /// Leading portion of the section (first few sentences), indexed as a
    /// secondary signal distinct from full content.
    pub context: String,

    /// Named-entity surface strings found in the section, in order of
    /// appearance.
    pub entities: Vec<String>,

    /// Content-bearing lemmas (noun/verb/adjective, non-stop-word) in
    /// encounter order. Duplicates are kept: they feed a ranked-term index.
    pub keywords: Vec<String>,
}

impl Section {
    /// Create a section with content only. Features are attached later by
    /// the extractor.
    pub fn new(id: SectionId, content: String) -> Self {
        Self {
            id,
            content,
            context: String::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Content length in characters.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Ordered document metadata with last-write-wins semantics.
///
/// Different extraction paths (PDF metadata, caller-supplied pairs, derived
/// keywords) may write the same key; the latest write replaces the value
/// while the key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataMap(IndexMap<String, String>);

impl MetadataMap {
    /// Create an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair. An existing key keeps its position but
    /// takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `fallback` when absent.
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
