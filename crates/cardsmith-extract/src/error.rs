//! Error types for text extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a document
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Path does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Extension is not one of the supported document types
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Filesystem error
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document container or content could not be decoded
    #[error("Failed to decode {}: {message}", path.display())]
    Decode {
        /// File being decoded
        path: PathBuf,
        /// What went wrong
        message: String,
    },
}

impl ExtractionError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode(path: &std::path::Path, message: impl Into<String>) -> Self {
        ExtractionError::Decode {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
