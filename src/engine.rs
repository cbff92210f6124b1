//! Ingestion and query orchestration.
//!
//! The engine ties the pipeline together: normalize, segment, extract
//! features, build the index, publish to session state; and at query time,
//! parse, rank, and assemble generation context. It is synchronous and
//! stateless per call; the session store holds the only shared state.
//!
//! State machine: the session starts `EMPTY`; the first successful
//! ingestion moves it to `INDEXED`; re-ingestion replaces the snapshot and
//! stays `INDEXED`. A failed ingestion never reverts an indexed session:
//! the last good index remains queryable.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::annotate::Annotator;
use crate::config::Settings;
use crate::error::{IngestError, QueryError};
use crate::features::FeatureExtractor;
use crate::generate::AnswerGenerator;
use crate::index::{Hit, SearchIndex};
use crate::normalize::normalize;
use crate::segment::Segmenter;
use crate::session::{SessionState, SessionStore};
use crate::types::MetadataMap;

/// Character budget for deriving document-level keywords.
const KEYWORD_SCAN_CHARS: usize = 5000;

/// How many top keywords summarize the document.
const TOP_KEYWORDS: usize = 5;

/// Reply used when retrieval finds nothing to ground an answer in.
const NO_CONTEXT_REPLY: &str = "Sorry, I couldn't find relevant information in the document.";

/// Result of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Display name of the ingested document.
    pub source_name: String,
    /// Number of retained sections.
    pub section_count: usize,
    /// Caller-supplied metadata merged with derived entries
    /// (`title`, `author`, `keywords`).
    pub metadata: MetadataMap,
}

/// Ranked retrieval output for one question.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Ranked hits, best first.
    pub hits: Vec<Hit>,
    /// Newline-joined content of the hits in rank order; handed to the
    /// answer generator.
    pub context: String,
}

/// Segmentation-and-retrieval engine.
///
/// Construction fails fast when the annotator capability is missing;
/// everything else is recoverable per call.
pub struct Engine {
    annotator: Arc<dyn Annotator>,
    session: Arc<SessionStore>,
    settings: Settings,
}

impl Engine {
    /// Create an engine with its own empty session store.
    pub fn new(annotator: Arc<dyn Annotator>, settings: Settings) -> Result<Self, IngestError> {
        Self::with_session(annotator, settings, Arc::new(SessionStore::new()))
    }

    /// Create an engine over an injected session store. Lets hosts share
    /// one store between an ingesting writer and querying readers.
    pub fn with_session(
        annotator: Arc<dyn Annotator>,
        settings: Settings,
        session: Arc<SessionStore>,
    ) -> Result<Self, IngestError> {
        if !annotator.is_available() {
            return Err(IngestError::AnnotatorUnavailable);
        }
        Ok(Self {
            annotator,
            session,
            settings,
        })
    }

    /// The session store backing this engine.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Ingest a document: normalize, segment, extract features, build the
    /// index, and atomically publish the new session state.
    ///
    /// On failure the previously published state is untouched.
    pub fn ingest(
        &self,
        text: &str,
        source_name: &str,
        metadata: MetadataMap,
    ) -> Result<DocumentSummary, IngestError> {
        let full_text = normalize(text);
        if full_text.is_empty() {
            return Err(IngestError::EmptyText);
        }

        let segmenter = Segmenter::new(self.settings.segmentation.clone());
        let mut sections = segmenter.segment(&full_text, self.annotator.as_ref());
        if sections.is_empty() {
            return Err(IngestError::NoSections);
        }

        FeatureExtractor::new(self.annotator.as_ref()).extract_all(&mut sections);

        let metadata = self.derive_metadata(metadata, source_name, &full_text);

        let section_count = sections.len();
        let index = match &self.settings.index_path {
            Some(dir) => SearchIndex::build_in_dir(sections, dir)?,
            None => SearchIndex::build(sections)?,
        };

        self.session.publish(SessionState {
            index,
            source_name: source_name.to_string(),
            metadata: metadata.clone(),
            full_text,
        });

        tracing::info!(
            target: "engine",
            source = source_name,
            sections = section_count,
            "document ingested"
        );

        Ok(DocumentSummary {
            source_name: source_name.to_string(),
            section_count,
            metadata,
        })
    }

    /// Answer a free-text question with ranked sections and assembled
    /// context.
    pub fn query(&self, question: &str) -> Result<ContextBundle, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let state = self.session.snapshot().ok_or(QueryError::NoActiveIndex)?;
        let hits = state.index.search(question, self.settings.search.limit)?;

        tracing::debug!(target: "engine", hits = hits.len(), "query executed");

        let context = hits
            .iter()
            .map(|h| h.section.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ContextBundle { hits, context })
    }

    /// Retrieve context for `question` and delegate to the generator.
    ///
    /// When retrieval finds nothing, a fixed "no relevant information"
    /// reply is returned and the generator is not called.
    pub fn ask(
        &self,
        question: &str,
        generator: &dyn AnswerGenerator,
    ) -> Result<String, QueryError> {
        let bundle = self.query(question)?;
        if bundle.context.is_empty() {
            return Ok(NO_CONTEXT_REPLY.to_string());
        }
        Ok(generator.generate(question, &bundle.context))
    }

    /// Merge caller-supplied metadata with derived entries.
    ///
    /// `title` and `author` are defaulted only when the caller (or an
    /// upstream extractor) did not provide them; `keywords` is always
    /// recomputed from the document text, replacing any stale value.
    fn derive_metadata(
        &self,
        mut metadata: MetadataMap,
        source_name: &str,
        full_text: &str,
    ) -> MetadataMap {
        if metadata.get("title").is_none() {
            metadata.insert("title", source_name);
        }
        if metadata.get("author").is_none() {
            metadata.insert("author", "Unknown");
        }

        let top = self.top_keywords(full_text);
        if !top.is_empty() {
            metadata.insert("keywords", top.join(", "));
        }
        metadata
    }

    /// Most frequent content-bearing lemmas in the leading portion of the
    /// document. Ties keep encounter order, so the result is deterministic.
    fn top_keywords(&self, full_text: &str) -> Vec<String> {
        let prefix: String = full_text.chars().take(KEYWORD_SCAN_CHARS).collect();
        let annotation = self.annotator.annotate(&prefix);

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for token in &annotation.tokens {
            if token.pos.is_content_bearing() && !token.is_stop {
                *counts.entry(token.lemma.clone()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(TOP_KEYWORDS)
            .map(|(lemma, _)| lemma)
            .collect()
    }
}
