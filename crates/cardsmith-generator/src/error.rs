//! Error types for the generator

use thiserror::Error;

/// Errors that can occur during flashcard generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Model output did not contain a usable JSON array
    #[error("Parse error: {0}")]
    Parse(String),

    /// Model backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Every attempt failed; `cause` is the error of the last one
    #[error("Generation failed after {attempts} attempt(s): {cause}")]
    Generation {
        /// Attempts made, including the last
        attempts: u32,
        /// Error of the final attempt
        cause: String,
    },

    /// Invalid or unreadable generator settings
    #[error("Configuration error: {0}")]
    Config(String),
}
