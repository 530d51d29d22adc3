//! Record module - the unit that is persisted and quizzed on

use chrono::{DateTime, Utc};

use crate::task::FileTask;

/// A question/answer pair as returned by a language model
///
/// Both fields are expected to be trimmed and non-empty; the response
/// parser only ever produces pairs that satisfy this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardPair {
    /// Question side of the card
    pub question: String,

    /// Answer side of the card
    pub answer: String,
}

impl CardPair {
    /// Create a new pair
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A flashcard enriched with the metadata of the document it came from
///
/// Records are immutable once created; re-generating a document produces
/// new records which the store reconciles by (question, answer, subject,
/// subtopic).
#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardRecord {
    /// Top-level folder the source document lives in
    pub subject: String,

    /// Second-level folder, or "General"
    pub subtopic: String,

    /// File name of the source document
    pub source_file: String,

    /// Question text
    pub question: String,

    /// Answer text
    pub answer: String,

    /// Difficulty label (empty when not assessed)
    pub difficulty: String,

    /// When this record was generated
    pub created_at: DateTime<Utc>,
}

impl FlashcardRecord {
    /// Create a record from a generated pair and the task it was generated for
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::{CardPair, FileTask, FlashcardRecord};
    /// use chrono::Utc;
    ///
    /// let task = FileTask::new("notes/Biology/Cells/mito.md", "Biology", "Cells", "mito.md");
    /// let pair = CardPair::new("What does the mitochondria produce?", "ATP");
    /// let record = FlashcardRecord::from_pair(pair, &task, Utc::now());
    /// assert_eq!(record.subject, "Biology");
    /// assert_eq!(record.source_file, "mito.md");
    /// assert!(record.difficulty.is_empty());
    /// ```
    pub fn from_pair(pair: CardPair, task: &FileTask, created_at: DateTime<Utc>) -> Self {
        Self {
            subject: task.subject.clone(),
            subtopic: task.subtopic.clone(),
            source_file: task.filename.clone(),
            question: pair.question,
            answer: pair.answer,
            difficulty: String::new(),
            created_at,
        }
    }

    /// Normalized question text used for duplicate detection
    pub fn question_key(&self) -> String {
        self.question.trim().to_lowercase()
    }

    /// Identity of the record in persistent storage
    pub fn storage_key(&self) -> (&str, &str, &str, &str) {
        (&self.question, &self.answer, &self.subject, &self.subtopic)
    }
}
