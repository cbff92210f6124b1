//! Multi-field stemmed section index and ranked search.
//!
//! One [`SearchIndex`] corresponds to exactly one ingested document. It is
//! built completely before being published to session state and never
//! mutated afterward; re-ingestion builds a fresh index.
//!
//! Four searchable fields per section use the same `en_stem` analyzer at
//! index and query time, so query terms match morphological variants:
//! - `content`  - full section text, positions indexed (phrase-capable)
//! - `context`  - leading sentences
//! - `entities` - entity surface strings
//! - `keywords` - content-bearing lemmas
//!
//! Queries are parsed leniently across all four fields with OR semantics
//! between terms and fields, scored with tantivy's BM25, and ranked by
//! descending score with ties broken by ascending section id.

use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::QueryParser;
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions, Value,
};
use tantivy::{
    Index, IndexReader, IndexSettings, ReloadPolicy, TantivyDocument as Document,
};

use crate::error::IngestError;
use crate::types::{Section, SectionId};

/// Tantivy's built-in English stemming analyzer (lowercase + Porter stem),
/// applied identically at index and query time.
const STEM_TOKENIZER: &str = "en_stem";

/// Writer heap for the one-shot build.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Schema fields for section storage.
#[derive(Debug)]
pub struct SectionSchema {
    /// Section sequence id, for hit materialization.
    pub id: Field,
    /// Full section text.
    pub content: Field,
    /// Leading-sentence summary.
    pub context: Field,
    /// Entity surface strings, space-joined.
    pub entities: Field,
    /// Keyword lemmas, space-joined.
    pub keywords: Field,
}

impl SectionSchema {
    /// Build the tantivy schema for section retrieval.
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let id = builder.add_u64_field("id", INDEXED | STORED | FAST);

        let stemmed = TextFieldIndexing::default()
            .set_tokenizer(STEM_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);

        // Content is stored verbatim; the remaining fields are search-only
        // signals, materialized from the owned section list instead.
        let content = builder.add_text_field(
            "content",
            TextOptions::default()
                .set_indexing_options(stemmed.clone())
                .set_stored(),
        );
        let context = builder.add_text_field(
            "context",
            TextOptions::default().set_indexing_options(stemmed.clone()),
        );
        let entities = builder.add_text_field(
            "entities",
            TextOptions::default().set_indexing_options(stemmed.clone()),
        );
        let keywords = builder.add_text_field(
            "keywords",
            TextOptions::default().set_indexing_options(stemmed),
        );

        let schema = builder.build();
        let section_schema = Self {
            id,
            content,
            context,
            entities,
            keywords,
        };
        (schema, section_schema)
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Hit {
    /// The matched section.
    pub section: Section,
    /// BM25 relevance score summed over matching fields.
    pub score: f32,
}

/// Immutable-once-built index over the sections of one document.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    schema: SectionSchema,
    /// Sections in id order; hit materialization indexes into this.
    sections: Vec<Section>,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("sections", &self.sections.len())
            .finish()
    }
}

impl SearchIndex {
    /// Build an in-memory index over `sections`.
    ///
    /// All-or-nothing: either every section is added and the complete index
    /// is returned, or the error propagates and nothing is published.
    pub fn build(sections: Vec<Section>) -> Result<Self, IngestError> {
        let (schema, section_schema) = SectionSchema::build();
        let index = Index::create_in_ram(schema);
        Self::populate(index, section_schema, sections)
    }

    /// Build a durable index in `dir`, replacing any previous index there.
    ///
    /// Persistence location and format are host configuration; the engine
    /// itself never depends on the index surviving the process.
    pub fn build_in_dir(sections: Vec<Section>, dir: impl AsRef<Path>) -> Result<Self, IngestError> {
        let dir = dir.as_ref();
        if dir.join("meta.json").exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;

        let (schema, section_schema) = SectionSchema::build();
        let mmap = MmapDirectory::open(dir)?;
        let index = Index::create(mmap, schema, IndexSettings::default())?;
        Self::populate(index, section_schema, sections)
    }

    fn populate(
        index: Index,
        schema: SectionSchema,
        sections: Vec<Section>,
    ) -> Result<Self, IngestError> {
        let mut writer = index.writer::<Document>(WRITER_HEAP_BYTES)?;

        for section in &sections {
            let mut doc = Document::new();
            doc.add_u64(schema.id, u64::from(section.id.value()));
            doc.add_text(schema.content, &section.content);
            doc.add_text(schema.context, &section.context);
            doc.add_text(schema.entities, section.entities.join(" "));
            doc.add_text(schema.keywords, section.keywords.join(" "));
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        reader.reload()?;

        tracing::debug!(target: "index", sections = sections.len(), "index built");

        Ok(Self {
            index,
            reader,
            schema,
            sections,
        })
    }

    /// Number of indexed sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Sections in id order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Execute a free-text query and return up to `limit` ranked hits.
    ///
    /// The question is parsed leniently (malformed query syntax degrades to
    /// the parseable remainder rather than failing) across all four fields
    /// with OR grouping: a section matches when any field contains any
    /// stemmed query term. No match yields an empty result, not an error.
    pub fn search(&self, question: &str, limit: usize) -> Result<Vec<Hit>, tantivy::TantivyError> {
        if limit == 0 || self.sections.is_empty() {
            return Ok(Vec::new());
        }

        let parser = QueryParser::for_index(
            &self.index,
            vec![
                self.schema.content,
                self.schema.context,
                self.schema.entities,
                self.schema.keywords,
            ],
        );
        let (query, parse_errors) = parser.parse_query_lenient(question);
        if !parse_errors.is_empty() {
            tracing::debug!(
                target: "index",
                errors = parse_errors.len(),
                "lenient query parse dropped malformed clauses"
            );
        }

        // Collect over every section so that score ties can be broken by
        // ascending id before truncation.
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(self.sections.len()))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: Document = searcher.doc(address)?;
            let id = doc
                .get_first(self.schema.id)
                .and_then(|v| v.as_u64())
                .map(|v| SectionId::new(v as u32));
            if let Some(id) = id
                && let Some(section) = self.sections.get(id.value() as usize)
            {
                hits.push(Hit {
                    section: section.clone(),
                    score,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.section.id.cmp(&b.section.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn section(id: u32, content: &str, keywords: &[&str]) -> Section {
        let mut s = Section::new(SectionId::new(id), content.to_string());
        s.context = content.split(". ").next().unwrap_or("").to_string();
        s.keywords = keywords.iter().map(|k| k.to_string()).collect();
        s
    }

    fn sample_sections() -> Vec<Section> {
        vec![
            section(
                0,
                "Revenue grew ten percent over the prior year. The growth was \
                 driven by subscription renewals.",
                &["revenue", "growth", "subscription"],
            ),
            section(
                1,
                "Operating costs fell slightly. Headcount was flat through \
                 the reporting period.",
                &["cost", "headcount"],
            ),
            section(
                2,
                "The outlook remains positive. Management expects margins to \
                 improve next quarter.",
                &["outlook", "margin"],
            ),
        ]
    }

    #[test]
    fn build_empty_index() {
        let index = SearchIndex::build(Vec::new()).unwrap();
        assert_eq!(index.section_count(), 0);
        assert!(index.search("anything", 3).unwrap().is_empty());
    }

    #[test]
    fn matching_query_returns_scored_section() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        let hits = index.search("revenue", 3).unwrap();

        assert!(!hits.is_empty());
        assert_eq!(hits[0].section.id, SectionId::new(0));
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn unmatched_query_returns_empty_result() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        let hits = index.search("nonexistent_term_xyz", 3).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn query_terms_match_stemmed_variants() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        // "improving" and the indexed "improve" share a stem
        let hits = index.search("improving", 3).unwrap();
        assert_eq!(hits[0].section.id, SectionId::new(2));
    }

    #[test]
    fn keyword_field_matches_without_content_match() {
        let sections = vec![section(0, "Figures are summarized in the table below.", &["margin"])];
        let index = SearchIndex::build(sections).unwrap();
        let hits = index.search("margins", 3).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn or_semantics_across_terms() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        // Neither section contains both words; OR grouping matches both.
        let hits = index.search("revenue headcount", 3).unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.section.id.value()).collect();
        assert!(ids.contains(&0));
        assert!(ids.contains(&1));
    }

    #[test]
    fn results_are_truncated_to_limit() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        // "the" is present everywhere
        let hits = index.search("the period year quarter", 2).unwrap();
        assert!(hits.len() <= 2);
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        let first = index.search("revenue growth costs outlook", 3).unwrap();
        for _ in 0..5 {
            let again = index.search("revenue growth costs outlook", 3).unwrap();
            let a: Vec<(u32, f32)> = first.iter().map(|h| (h.section.id.value(), h.score)).collect();
            let b: Vec<(u32, f32)> = again.iter().map(|h| (h.section.id.value(), h.score)).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn identical_sections_tie_break_by_ascending_id() {
        let text = "Margins improved across every region this quarter.";
        let sections = vec![
            section(0, text, &["margin"]),
            section(1, text, &["margin"]),
            section(2, text, &["margin"]),
        ];
        let index = SearchIndex::build(sections).unwrap();
        let hits = index.search("margins", 3).unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.section.id.value()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn durable_index_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();

        let first = SearchIndex::build_in_dir(sample_sections(), dir.path()).unwrap();
        assert_eq!(first.section_count(), 3);

        let replacement = vec![section(0, "A fresh document about logistics.", &["logistics"])];
        let second = SearchIndex::build_in_dir(replacement, dir.path()).unwrap();
        assert_eq!(second.section_count(), 1);
        assert!(second.search("revenue", 3).unwrap().is_empty());
        assert_eq!(second.search("logistics", 3).unwrap().len(), 1);
    }

    #[test]
    fn phrase_query_requires_adjacency() {
        let index = SearchIndex::build(sample_sections()).unwrap();
        let phrase = index.search("\"subscription renewals\"", 3).unwrap();
        assert_eq!(phrase.len(), 1);
        assert_eq!(phrase[0].section.id, SectionId::new(0));

        let reversed = index.search("\"renewals subscription\"", 3).unwrap();
        assert!(reversed.is_empty());
    }
}
