//! Answer generation capability consumed by the host.
//!
//! The engine retrieves context; turning (question, context) into a
//! natural-language answer is an external concern. Hosts wire a language
//! model behind this trait and pass it to [`crate::engine::Engine::ask`].

/// External answer-generation capability.
pub trait AnswerGenerator: Send + Sync {
    /// Produce an answer to `question` grounded in `context`.
    ///
    /// `context` is the newline-joined content of the retrieved sections in
    /// rank order; it is never empty when this is called.
    fn generate(&self, question: &str, context: &str) -> String;
}
