//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the generation pipeline and
//! infrastructure. Implementations live in other crates.

use std::path::{Path, PathBuf};

use crate::FlashcardRecord;

/// Sampling options passed to a model backend on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature; `0.0` or below means greedy decoding where supported
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Trait for language model backends
///
/// Implemented by the infrastructure layer (cardsmith-llm). Calls block for
/// the duration of the network round-trip or local inference.
pub trait ModelBackend {
    /// Error type for backend operations
    type Error;

    /// Generate a raw text completion for a prompt
    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error>;

    /// Short human-readable identifier used in logs (e.g. "ollama:llama2")
    fn describe(&self) -> String;
}

impl<B: ModelBackend + ?Sized> ModelBackend for Box<B> {
    type Error = B::Error;

    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        (**self).generate_text(prompt, options)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Trait for turning a document into plain text
///
/// Implemented by the infrastructure layer (cardsmith-extract)
pub trait TextSource {
    /// Error type for extraction operations
    type Error;

    /// Extract the full text of a document
    fn extract_text(&self, path: &Path) -> Result<String, Self::Error>;
}

/// Trait for persisting flashcard records
///
/// Implemented by the infrastructure layer (cardsmith-store)
pub trait RecordSink {
    /// Error type for store operations
    type Error;

    /// Append records for a subject, deduplicating against what is already stored
    ///
    /// Returns the location the records were written to.
    fn save_records(&mut self, subject: &str, records: &[FlashcardRecord]) -> Result<PathBuf, Self::Error>;
}
