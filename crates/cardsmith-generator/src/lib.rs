//! Cardsmith Generator
//!
//! Turns study documents into question/answer flashcards using a language
//! model backend.
//!
//! # Architecture
//!
//! ```text
//! Document → TextSource → Chunker → Prompt → ModelBackend → Parser → Records
//!                                      ↑__________retry__________|
//! ```
//!
//! Each chunk is an independent unit of work with its own bounded retry
//! loop. Records are validated and de-duplicated before they reach a store.
//!
//! # Example Usage
//!
//! ```
//! use cardsmith_generator::{FlashcardGenerator, GeneratorConfig};
//! use cardsmith_domain::TextSource;
//! use cardsmith_llm::MockBackend;
//! use std::path::Path;
//!
//! struct Inline;
//!
//! impl TextSource for Inline {
//!     type Error = String;
//!     fn extract_text(&self, _path: &Path) -> Result<String, String> {
//!         Ok("Mitochondria produce ATP for the cell.".to_string())
//!     }
//! }
//!
//! let backend = MockBackend::new(r#"[{"question": "What do mitochondria produce?", "answer": "ATP"}]"#);
//! let generator = FlashcardGenerator::new(backend, Inline, GeneratorConfig::default());
//!
//! let cards = generator
//!     .generate_flashcards_from_text("Mitochondria produce ATP for the cell.", 8, 3)
//!     .unwrap();
//! assert_eq!(cards[0].answer, "ATP");
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod generator;
mod parser;
mod prompt;
pub mod retry;
mod types;
mod validate;

pub use chunking::{chunk_text, TextChunker};
pub use config::GeneratorConfig;
pub use error::GeneratorError;
pub use generator::{FlashcardGenerator, ProgressFn};
pub use parser::parse_cards;
pub use prompt::{build_prompt, PromptBuilder};
pub use types::{GenerationResult, GenerationStatistics};
pub use validate::{
    filter_duplicate_questions, generation_statistics, prepare_for_persistence,
    validate_flashcard_record, ValidationError, MAX_ANSWER_CHARS, MAX_QUESTION_CHARS,
    MIN_ANSWER_CHARS, MIN_QUESTION_CHARS,
};
