//! Cardsmith Domain Layer
//!
//! This crate contains the core data model for Cardsmith and the trait
//! interfaces that every other layer depends upon. It carries no I/O and
//! only one external dependency (`chrono`, for record timestamps).
//!
//! ## Key Concepts
//!
//! - **CardPair**: a bare question/answer pair as produced by a language model
//! - **FlashcardRecord**: a pair enriched with subject, subtopic and source metadata
//! - **FileTask**: one document to process, with its subject/subtopic derived
//!   from where it lives under the notes root
//!
//! ## Architecture
//!
//! - Pure data and derivation rules only
//! - Infrastructure implementations (model backends, text extraction,
//!   persistence) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use record::{CardPair, FlashcardRecord};
pub use task::{FileTask, DEFAULT_CATEGORY};
pub use traits::{GenerationOptions, ModelBackend, RecordSink, TextSource};
