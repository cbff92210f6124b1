//! Text annotation capability consumed by the engine.
//!
//! Segmentation and feature extraction need sentence boundaries, per-token
//! lemma/part-of-speech/stop-word flags, and named-entity spans. Production
//! hosts wire in a real NLP service behind the [`Annotator`] trait; the
//! bundled [`RuleAnnotator`] is a deterministic heuristic fallback that keeps
//! the engine usable (and testable) without one.

use serde::{Deserialize, Serialize};

/// A byte range into the annotated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Resolve this span against its source text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Coarse part-of-speech tag. Only the classes the engine filters on are
/// distinguished; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Other,
}

impl PartOfSpeech {
    /// Whether this class carries content worth indexing as a keyword.
    pub fn is_content_bearing(&self) -> bool {
        matches!(self, Self::Noun | Self::Verb | Self::Adjective)
    }
}

/// A single annotated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Lemma (root form) of the token, not the surface form.
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub is_stop: bool,
}

/// Full annotation of one input string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Sentence spans in document order.
    pub sentences: Vec<Span>,
    /// Tokens in document order.
    pub tokens: Vec<Token>,
    /// Named-entity spans in order of appearance.
    pub entities: Vec<Span>,
}

/// External NLP capability.
///
/// Implementations must be deterministic for a given input: the segmenter
/// and feature extractor derive index contents from the annotation, and
/// repeated ingestion of the same text must build the same index.
pub trait Annotator: Send + Sync {
    /// Annotate `text` with sentences, tokens, and entities.
    fn annotate(&self, text: &str) -> Annotation;

    /// Whether the capability is ready. Checked once at engine
    /// construction; a missing annotator aborts startup rather than
    /// failing per call.
    fn is_available(&self) -> bool {
        true
    }
}

/// Common English stop words, matched case-insensitively.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your",
];

/// Deterministic rule-based annotator.
///
/// Heuristics, not linguistics:
/// - Sentences end at `.`, `!`, `?` followed by whitespace (or end of
///   input), and at `:` followed by whitespace so that short heading-like
///   lines survive normalization as their own sentence.
/// - Lemmas are lowercased surface forms with a possessive `'s` stripped.
/// - Part of speech is guessed from suffix shape; unknown words default to
///   noun, which errs toward keeping keywords.
/// - Entities are runs of two or more capitalized words, plus single
///   capitalized words that do not open a sentence.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleAnnotator;

impl RuleAnnotator {
    pub fn new() -> Self {
        Self
    }

    fn guess_pos(word: &str) -> PartOfSpeech {
        if word.chars().any(|c| c.is_ascii_digit()) {
            return PartOfSpeech::Other;
        }
        const ADJ_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ish", "less", "ant"];
        const VERB_SUFFIXES: &[&str] = &["ing", "ize", "ise", "ify"];
        let lower = word.to_lowercase();
        if ADJ_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            PartOfSpeech::Adjective
        } else if VERB_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            PartOfSpeech::Verb
        } else {
            PartOfSpeech::Noun
        }
    }

    fn lemma_of(word: &str) -> String {
        let lower = word.to_lowercase();
        lower
            .strip_suffix("'s")
            .or_else(|| lower.strip_suffix("\u{2019}s"))
            .map(str::to_string)
            .unwrap_or(lower)
    }

    fn split_sentences(text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let bytes = text.as_bytes();
        let mut start = 0;

        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let is_terminator = matches!(b, b'.' | b'!' | b'?' | b':');
            if is_terminator {
                let at_end = i + 1 == bytes.len();
                let before_space = !at_end && bytes[i + 1].is_ascii_whitespace();
                if at_end || before_space {
                    push_trimmed(text, start, i + 1, &mut spans);
                    start = i + 1;
                }
            }
            i += 1;
        }
        push_trimmed(text, start, bytes.len(), &mut spans);
        spans
    }

    fn tokenize(text: &str) -> Vec<(Span, String)> {
        let mut tokens = Vec::new();
        let mut word_start: Option<usize> = None;

        for (i, c) in text.char_indices() {
            let is_word = c.is_alphanumeric() || c == '\'' || c == '\u{2019}';
            match (word_start, is_word) {
                (None, true) => word_start = Some(i),
                (Some(start), false) => {
                    tokens.push((Span::new(start, i), text[start..i].to_string()));
                    word_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = word_start {
            tokens.push((Span::new(start, text.len()), text[start..].to_string()));
        }
        tokens
    }

    fn detect_entities(text: &str, words: &[(Span, String)], sentences: &[Span]) -> Vec<Span> {
        let sentence_starts: Vec<usize> = sentences.iter().map(|s| s.start).collect();
        let is_cap = |w: &str| {
            w.chars()
                .next()
                .map(|c| c.is_uppercase())
                .unwrap_or(false)
        };

        let mut entities = Vec::new();
        let mut run: Option<(usize, usize, usize)> = None; // (start, end, word count)

        for (span, word) in words {
            if is_cap(word) {
                run = match run {
                    // Extend only across plain spaces, never across punctuation.
                    Some((start, end, n))
                        if text[end..span.start].chars().all(|c| c == ' ') =>
                    {
                        Some((start, span.end, n + 1))
                    }
                    Some(prev) => {
                        flush_entity(prev, &sentence_starts, &mut entities);
                        Some((span.start, span.end, 1))
                    }
                    None => Some((span.start, span.end, 1)),
                };
            } else if let Some(prev) = run.take() {
                flush_entity(prev, &sentence_starts, &mut entities);
            }
        }
        if let Some(prev) = run {
            flush_entity(prev, &sentence_starts, &mut entities);
        }
        entities
    }
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<Span>) {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = slice.len() - slice.trim_start().len();
    spans.push(Span::new(start + lead, start + lead + trimmed.len()));
}

fn flush_entity(run: (usize, usize, usize), sentence_starts: &[usize], out: &mut Vec<Span>) {
    let (start, end, words) = run;
    // A lone capitalized word at a sentence start is ordinary casing.
    if words == 1 && sentence_starts.contains(&start) {
        return;
    }
    out.push(Span::new(start, end));
}

impl Annotator for RuleAnnotator {
    fn annotate(&self, text: &str) -> Annotation {
        let sentences = Self::split_sentences(text);
        let words = Self::tokenize(text);
        let entities = Self::detect_entities(text, &words, &sentences);

        let tokens = words
            .iter()
            .map(|(_, word)| {
                let lemma = Self::lemma_of(word);
                let is_stop = STOP_WORDS.binary_search(&lemma.as_str()).is_ok();
                let pos = if is_stop {
                    PartOfSpeech::Other
                } else {
                    Self::guess_pos(word)
                };
                Token {
                    lemma,
                    pos,
                    is_stop,
                }
            })
            .collect();

        Annotation {
            sentences,
            tokens,
            entities,
        }
    }
}
