//! Sentence-accumulating section segmenter.
//!
//! Partitions normalized text into bounded-length sections along sentence
//! boundaries. Sentences are never split: a single sentence longer than the
//! maximum becomes a section of its own. Accumulated text that falls short
//! of the minimum at flush time is dropped silently; this is a deliberate
//! lossy heuristic, not an error.

use crate::annotate::Annotator;
use crate::config::SegmentationConfig;
use crate::types::{Section, SectionId};

/// Heading heuristic: a short sentence ending with a colon.
///
/// After whitespace normalization, document headings tend to survive as
/// colon-terminated fragments ("Financial Overview:"). Treating them as
/// break points keeps a heading with the text that follows it. This is a
/// narrow signal by design; bullet lists and numbered headers are not
/// detected.
pub fn is_heading_like(sentence: &str, heading_max_chars: usize) -> bool {
    sentence.ends_with(':') && sentence.chars().count() < heading_max_chars
}

/// Splits normalized text into sections using annotator-provided sentence
/// boundaries.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Segment `text` into sections with ids 0..N-1 in document order.
    ///
    /// Empty input yields zero sections. Every emitted section satisfies
    /// `content.chars().count() >= section_min_length`; content stays at or
    /// under `section_max_length` unless it is a single over-long sentence.
    pub fn segment(&self, text: &str, annotator: &dyn Annotator) -> Vec<Section> {
        if text.is_empty() {
            return Vec::new();
        }

        let annotation = annotator.annotate(text);

        let mut sections = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_chars = 0usize;
        let mut dropped = 0usize;

        for span in &annotation.sentences {
            let sentence = span.text(text).trim();
            if sentence.is_empty() {
                continue;
            }
            let sentence_chars = sentence.chars().count();

            let over_max = buffer_chars + sentence_chars > self.config.section_max_length;
            if over_max || is_heading_like(sentence, self.config.heading_max_chars) {
                self.flush(&mut buffer, &mut buffer_chars, &mut sections, &mut dropped);
            }

            buffer.push(sentence);
            buffer_chars += sentence_chars;
        }
        self.flush(&mut buffer, &mut buffer_chars, &mut sections, &mut dropped);

        tracing::debug!(
            target: "segment",
            sections = sections.len(),
            dropped,
            "segmented document"
        );
        sections
    }

    /// Join the buffered sentences and emit a section when the result meets
    /// the minimum length; otherwise the buffered text is lost.
    fn flush(
        &self,
        buffer: &mut Vec<&str>,
        buffer_chars: &mut usize,
        sections: &mut Vec<Section>,
        dropped: &mut usize,
    ) {
        if buffer.is_empty() {
            return;
        }
        let content = buffer.join(" ");
        if content.chars().count() >= self.config.section_min_length {
            let id = SectionId::new(sections.len() as u32);
            sections.push(Section::new(id, content));
        } else {
            *dropped += 1;
        }
        buffer.clear();
        *buffer_chars = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::RuleAnnotator;

    fn segmenter(min: usize, max: usize) -> Segmenter {
        Segmenter::new(SegmentationConfig {
            section_min_length: min,
            section_max_length: max,
            heading_max_chars: 100,
        })
    }

    /// Text of n sentences, each `width` chars of the form "wordx wordx. "
    fn filler(n: usize, seed: &str) -> String {
        (0..n)
            .map(|i| format!("The {seed} metric number {i} moved in the reporting period."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_input_yields_no_sections() {
        let sections = segmenter(200, 1000).segment("", &RuleAnnotator::new());
        assert!(sections.is_empty());
    }

    #[test]
    fn short_document_below_minimum_is_dropped() {
        let sections = segmenter(200, 1000).segment("Too short to keep.", &RuleAnnotator::new());
        assert!(sections.is_empty());
    }

    #[test]
    fn single_section_when_total_fits_under_max() {
        // ~5 sentences of ~55 chars: above min=200, below max=1000
        let text = filler(5, "revenue");
        let sections = segmenter(200, 1000).segment(&text, &RuleAnnotator::new());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, SectionId::new(0));
        // All sentences present, joined by single spaces
        assert_eq!(sections[0].content, text);
    }

    #[test]
    fn sections_respect_bounds_and_order() {
        let text = filler(40, "cost");
        let sections = segmenter(100, 300).segment(&text, &RuleAnnotator::new());
        assert!(sections.len() > 1);

        for (i, section) in sections.iter().enumerate() {
            assert_eq!(section.id, SectionId::new(i as u32));
            assert!(section.char_count() >= 100);
            assert!(section.char_count() <= 300);
        }
    }

    #[test]
    fn concatenation_preserves_sentence_order() {
        let text = filler(40, "margin");
        let sections = segmenter(100, 300).segment(&text, &RuleAnnotator::new());

        // Sections concatenated reproduce a subsequence of the original
        // sentence stream, in order and without duplication.
        let joined = sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let mut cursor = 0;
        for sentence in joined.split(". ") {
            let pos = text[cursor..]
                .find(sentence.trim_end_matches('.'))
                .expect("section sentence must appear in original order");
            cursor += pos;
        }
    }

    #[test]
    fn oversized_single_sentence_is_kept_whole() {
        // One sentence with no internal terminators, longer than max
        let long = format!("The filing lists {} as related parties.", "x".repeat(400));
        let sections = segmenter(100, 300).segment(&long, &RuleAnnotator::new());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, long);
        assert!(sections[0].char_count() > 300);
    }

    #[test]
    fn heading_like_sentence_forces_a_break() {
        let before = filler(4, "revenue");
        let after = filler(4, "outlook");
        let text = format!("{before} Outlook and Guidance: {after}");
        let sections = segmenter(100, 10_000).segment(&text, &RuleAnnotator::new());

        // Without the heading the whole text fits one section; the colon
        // heading splits it so the heading opens the second section.
        assert_eq!(sections.len(), 2);
        assert!(sections[1].content.starts_with("Outlook and Guidance:"));
    }

    #[test]
    fn long_colon_sentence_is_not_a_heading() {
        assert!(is_heading_like("Summary:", 100));
        let long = format!("{}:", "y".repeat(120));
        assert!(!is_heading_like(&long, 100));
        assert!(!is_heading_like("No colon here", 100));
    }

    #[test]
    fn undersized_remainder_is_dropped_silently() {
        // Enough text for one full section, then a tiny trailing sentence
        // group that gets cut off by a heading break and dropped.
        let body = filler(5, "revenue");
        let text = format!("{body} Appendix: Tiny tail.");
        let sections = segmenter(200, 1000).segment(&text, &RuleAnnotator::new());
        assert_eq!(sections.len(), 1);
        assert!(!sections[0].content.contains("Tiny tail"));
    }
}
