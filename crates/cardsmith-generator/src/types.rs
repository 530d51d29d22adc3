//! Batch result types

use cardsmith_domain::FlashcardRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Records produced by a batch, keyed by source filename
///
/// Keeps the order in which files first produced records. Only files with at
/// least one record are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    files: Vec<(String, Vec<FlashcardRecord>)>,
    /// Filename to position in `files`
    index: HashMap<String, usize>,
}

impl GenerationResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records for `filename`
    ///
    /// Records for a filename already present are appended to the existing
    /// entry. Empty input is ignored.
    pub fn append(&mut self, filename: impl Into<String>, records: Vec<FlashcardRecord>) {
        if records.is_empty() {
            return;
        }
        let filename = filename.into();
        match self.index.get(&filename) {
            Some(&position) => self.files[position].1.extend(records),
            None => {
                self.index.insert(filename.clone(), self.files.len());
                self.files.push((filename, records));
            }
        }
    }

    /// Records for one file
    pub fn get(&self, filename: &str) -> Option<&[FlashcardRecord]> {
        self.index
            .get(filename)
            .map(|&position| self.files[position].1.as_slice())
    }

    /// Iterate (filename, records) in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FlashcardRecord])> {
        self.files
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of files with records
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file produced records
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total records across all files
    pub fn total_records(&self) -> usize {
        self.files.iter().map(|(_, records)| records.len()).sum()
    }

    /// Flatten into one list, file order preserved
    pub fn into_records(self) -> Vec<FlashcardRecord> {
        self.files
            .into_iter()
            .flat_map(|(_, records)| records)
            .collect()
    }
}

/// Summary of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStatistics {
    /// Records across all files
    pub total_flashcards: usize,

    /// Files that produced at least one record
    pub files_processed: usize,

    /// Record count per subject
    pub questions_by_subject: BTreeMap<String, usize>,

    /// Record count per source filename
    pub questions_by_file: BTreeMap<String, usize>,

    /// Mean records per processed file; 0 when none
    pub average_cards_per_file: f64,
}
