//! Section-based document retrieval for question answering.
//!
//! Ingests extracted document text, splits it into bounded-length sections
//! along sentence boundaries, indexes each section across four stemmed
//! fields (content, context, entities, keywords), and answers free-text
//! questions with the top-ranked sections as generation context.

pub mod annotate;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod generate;
pub mod index;
pub mod logging;
pub mod normalize;
pub mod segment;
pub mod session;
pub mod types;

pub use annotate::{Annotation, Annotator, PartOfSpeech, RuleAnnotator, Span, Token};
pub use config::{SegmentationConfig, SearchConfig, Settings};
pub use engine::{ContextBundle, DocumentSummary, Engine};
pub use error::{IngestError, QueryError};
pub use generate::AnswerGenerator;
pub use index::{Hit, SearchIndex};
pub use normalize::normalize;
pub use segment::Segmenter;
pub use session::{SessionState, SessionStore};
pub use types::{MetadataMap, Section, SectionId};
