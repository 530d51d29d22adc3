//! Record validation, deduplication and statistics

use crate::types::{GenerationResult, GenerationStatistics};
use cardsmith_domain::FlashcardRecord;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Shortest acceptable question, in characters after trimming
pub const MIN_QUESTION_CHARS: usize = 10;

/// Longest acceptable question
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Shortest acceptable answer
pub const MIN_ANSWER_CHARS: usize = 5;

/// Longest acceptable answer
pub const MAX_ANSWER_CHARS: usize = 2000;

/// Reasons a record is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty after trimming
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// Question length outside the accepted range
    #[error("question length {length} outside [{min}, {max}]")]
    QuestionLength {
        /// Trimmed length in characters
        length: usize,
        /// Minimum allowed
        min: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Answer length outside the accepted range
    #[error("answer length {length} outside [{min}, {max}]")]
    AnswerLength {
        /// Trimmed length in characters
        length: usize,
        /// Minimum allowed
        min: usize,
        /// Maximum allowed
        max: usize,
    },
}

/// Check a record against the persistence rules
///
/// # Examples
///
/// ```
/// use cardsmith_domain::{CardPair, FileTask, FlashcardRecord};
/// use cardsmith_generator::{validate_flashcard_record, ValidationError};
/// use chrono::Utc;
///
/// let task = FileTask::new("n/Bio/cells.md", "Bio", "General", "cells.md");
/// let ok = FlashcardRecord::from_pair(CardPair::new("What is a cell?", "Basic unit of life"), &task, Utc::now());
/// assert!(validate_flashcard_record(&ok).is_ok());
///
/// let short = FlashcardRecord::from_pair(CardPair::new("Why?", "Because"), &task, Utc::now());
/// assert!(matches!(
///     validate_flashcard_record(&short),
///     Err(ValidationError::QuestionLength { length: 4, .. })
/// ));
/// ```
pub fn validate_flashcard_record(record: &FlashcardRecord) -> Result<(), ValidationError> {
    let required = [
        ("subject", &record.subject),
        ("subtopic", &record.subtopic),
        ("source_file", &record.source_file),
        ("question", &record.question),
        ("answer", &record.answer),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(name));
        }
    }

    let length = record.question.trim().chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&length) {
        return Err(ValidationError::QuestionLength {
            length,
            min: MIN_QUESTION_CHARS,
            max: MAX_QUESTION_CHARS,
        });
    }

    let length = record.answer.trim().chars().count();
    if !(MIN_ANSWER_CHARS..=MAX_ANSWER_CHARS).contains(&length) {
        return Err(ValidationError::AnswerLength {
            length,
            min: MIN_ANSWER_CHARS,
            max: MAX_ANSWER_CHARS,
        });
    }

    Ok(())
}

/// Drop records whose normalized question was already seen
///
/// The first occurrence wins and order is preserved.
pub fn filter_duplicate_questions(records: Vec<FlashcardRecord>) -> Vec<FlashcardRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.question_key()))
        .collect()
}

/// Drop invalid records, then duplicate questions
pub fn prepare_for_persistence(records: Vec<FlashcardRecord>) -> Vec<FlashcardRecord> {
    let total = records.len();

    let valid: Vec<FlashcardRecord> = records
        .into_iter()
        .filter(|record| match validate_flashcard_record(record) {
            Ok(()) => true,
            Err(e) => {
                debug!(question = %record.question, "Dropping invalid record: {}", e);
                false
            }
        })
        .collect();
    let valid_count = valid.len();

    let unique = filter_duplicate_questions(valid);

    info!(
        total,
        invalid = total - valid_count,
        duplicates = valid_count - unique.len(),
        kept = unique.len(),
        "Prepared records for persistence"
    );
    unique
}

/// Summarize a batch result
pub fn generation_statistics(result: &GenerationResult) -> GenerationStatistics {
    let mut stats = GenerationStatistics::default();

    for (filename, records) in result.iter() {
        stats.total_flashcards += records.len();
        stats.files_processed += 1;
        *stats.questions_by_file.entry(filename.to_string()).or_insert(0) += records.len();

        for record in records {
            *stats
                .questions_by_subject
                .entry(record.subject.clone())
                .or_insert(0) += 1;
        }
    }

    if stats.files_processed > 0 {
        stats.average_cards_per_file = stats.total_flashcards as f64 / stats.files_processed as f64;
    }
    stats
}
