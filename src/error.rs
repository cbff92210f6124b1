//! Error taxonomy for ingestion and querying.
//!
//! Every variant is a recoverable-by-caller condition. Ingestion failures
//! leave the previously published session state untouched; query failures
//! are expected to surface as "no results" to end users, not as faults.
//! The one startup-fatal condition is a missing annotator capability,
//! reported by [`IngestError::AnnotatorUnavailable`] at engine construction.

use thiserror::Error;

/// Errors from document ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input text was empty after whitespace normalization.
    #[error("document contains no extractable text")]
    EmptyText,

    /// Segmentation produced zero retainable sections.
    #[error("segmentation produced no sections (all candidates below minimum length)")]
    NoSections,

    /// The mandatory annotator capability is missing. Fatal at startup,
    /// never retried per call.
    #[error("text annotator is unavailable")]
    AnnotatorUnavailable,

    /// Index construction failed; nothing was published.
    #[error("index build failed: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// On-disk index directory could not be opened.
    #[error("index directory error: {0}")]
    Directory(#[from] tantivy::directory::error::OpenDirectoryError),

    /// IO error while preparing a durable index directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from querying.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No document has been successfully ingested yet.
    #[error("no document has been ingested")]
    NoActiveIndex,

    /// The question was blank after trimming.
    #[error("question is empty")]
    EmptyQuestion,

    /// Search execution failed inside the index.
    #[error("search failed: {0}")]
    Index(#[from] tantivy::TantivyError),
}
