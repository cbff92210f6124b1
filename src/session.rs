//! Process-wide session state with replace-on-reingest semantics.
//!
//! The active index slot is the only shared mutable resource in the engine.
//! State is published as an immutable `Arc` snapshot: readers clone the Arc
//! under a read lock and keep working on a consistent view even while a
//! writer swaps in a replacement. A query in flight observes either the
//! fully-old or the fully-new state, never a partially-built one.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::index::SearchIndex;
use crate::types::MetadataMap;

/// Everything published by one successful ingestion.
#[derive(Debug)]
pub struct SessionState {
    /// The active index. Built completely before publication.
    pub index: SearchIndex,
    /// Display name of the originating document.
    pub source_name: String,
    /// Extracted document metadata (title, author, derived keywords, plus
    /// caller-supplied pairs).
    pub metadata: MetadataMap,
    /// Full normalized text of the current document.
    pub full_text: String,
}

/// Holder of the active session snapshot.
///
/// Created empty at process start; fully replaced (never merged) by each
/// successful ingestion; read by every query until the next replacement.
#[derive(Debug, Default)]
pub struct SessionStore {
    active: RwLock<Option<Arc<SessionState>>>,
}

impl SessionStore {
    /// Create an empty store (no document ingested yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the active state with a fully-built snapshot.
    pub fn publish(&self, state: SessionState) {
        let snapshot = Arc::new(state);
        *self.active.write() = Some(snapshot);
    }

    /// Current snapshot, or `None` before the first successful ingestion.
    pub fn snapshot(&self) -> Option<Arc<SessionState>> {
        self.active.read().clone()
    }

    /// Whether any document has been ingested.
    pub fn is_empty(&self) -> bool {
        self.active.read().is_none()
    }
}
