//! Per-section searchable feature derivation.
//!
//! Uses the annotator to populate the three secondary signals of a section:
//! keyword lemmas, entity surface strings, and the leading-context summary.

use crate::annotate::Annotator;
use crate::types::Section;

/// Number of leading sentences forming the section context.
const CONTEXT_SENTENCES: usize = 3;

/// Derives `keywords`, `entities`, and `context` for sections.
pub struct FeatureExtractor<'a> {
    annotator: &'a dyn Annotator,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(annotator: &'a dyn Annotator) -> Self {
        Self { annotator }
    }

    /// Populate the feature fields of `section` from its content.
    ///
    /// - `keywords`: lemmas of non-stop noun/verb/adjective tokens, in
    ///   encounter order, duplicates kept.
    /// - `entities`: entity surface strings in order of appearance.
    /// - `context`: the first three sentences joined with single spaces.
    pub fn extract(&self, section: &mut Section) {
        let annotation = self.annotator.annotate(&section.content);

        section.keywords = annotation
            .tokens
            .iter()
            .filter(|t| t.pos.is_content_bearing() && !t.is_stop)
            .map(|t| t.lemma.clone())
            .collect();

        section.entities = annotation
            .entities
            .iter()
            .map(|span| span.text(&section.content).to_string())
            .collect();

        section.context = annotation
            .sentences
            .iter()
            .take(CONTEXT_SENTENCES)
            .map(|span| span.text(&section.content))
            .collect::<Vec<_>>()
            .join(" ");
    }

    /// Extract features for every section in place.
    pub fn extract_all(&self, sections: &mut [Section]) {
        for section in sections.iter_mut() {
            self.extract(section);
        }
    }
}
