//! Cardsmith Extract
//!
//! Reads study notes from disk. `scan_notes` walks a notes root and turns
//! every supported document into a `FileTask`; `FileSystemSource` implements
//! the domain `TextSource` trait so the generator can pull plain text out of
//! `.txt`, `.md`, `.docx` and `.pdf` files.
//!
//! # Examples
//!
//! ```no_run
//! use cardsmith_domain::TextSource;
//! use cardsmith_extract::{scan_notes, FileSystemSource};
//! use std::path::Path;
//!
//! let source = FileSystemSource::new();
//! for task in scan_notes(Path::new("notes")).unwrap() {
//!     let text = source.extract_text(&task.path).unwrap();
//!     println!("{}/{}: {} chars", task.subject, task.subtopic, text.len());
//! }
//! ```

#![warn(missing_docs)]

mod error;
mod extract;
mod scan;

pub use error::ExtractionError;
pub use extract::{
    extract_text, is_supported_file, supported_extensions, FileSystemSource, SUPPORTED_EXTENSIONS,
};
pub use scan::scan_notes;
