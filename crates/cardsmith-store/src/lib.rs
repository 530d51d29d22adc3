//! Cardsmith Storage Layer
//!
//! Persists flashcard records in SQLite files inside an output directory and
//! implements the `RecordSink` trait from `cardsmith-domain`.
//!
//! # Layout
//!
//! - `StorageMode::Global`: every record goes to `flashcards.db`
//! - `StorageMode::PerSubject`: one `<subject>_flashcards.db` per subject
//!
//! Within a file a record is identified by (question, answer, subject,
//! subtopic). Saving an existing card again replaces it, so the newest copy
//! wins.
//!
//! # Examples
//!
//! ```no_run
//! use cardsmith_store::{SqliteStore, StorageMode};
//!
//! let store = SqliteStore::open("output", StorageMode::PerSubject).unwrap();
//! println!("Biology cards go to {}", store.store_path("Biology").display());
//! ```

#![warn(missing_docs)]

mod export;

pub use export::{backup_store_file, export_csv, CSV_HEADERS};

use cardsmith_domain::{FlashcardRecord, RecordSink};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Store file used in global mode
pub const GLOBAL_STORE_FILE: &str = "flashcards.db";

/// Suffix of per-subject store files
pub const SUBJECT_STORE_SUFFIX: &str = "_flashcards.db";

/// File prefix used when a record has no subject
const FALLBACK_SUBJECT: &str = "General";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// How records are spread over store files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Single `flashcards.db`
    #[default]
    Global,

    /// One `<subject>_flashcards.db` per subject
    PerSubject,
}

/// Store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File layout
    pub mode: StorageMode,
}

/// SQLite-backed flashcard store rooted at an output directory
///
/// Connections are opened per operation; the store itself only holds the
/// directory and the layout.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    output_dir: PathBuf,
    mode: StorageMode,
}

impl SqliteStore {
    /// Open a store, creating the output directory if needed
    pub fn open<P: AsRef<Path>>(output_dir: P, mode: StorageMode) -> Result<Self, StoreError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir, mode })
    }

    /// Directory holding the store files
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File layout in use
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// File that records for `subject` are written to
    pub fn store_path(&self, subject: &str) -> PathBuf {
        let filename = match self.mode {
            StorageMode::Global => GLOBAL_STORE_FILE.to_string(),
            StorageMode::PerSubject => {
                let subject = subject.trim();
                let subject = if subject.is_empty() { FALLBACK_SUBJECT } else { subject };
                format!("{}{}", subject, SUBJECT_STORE_SUFFIX)
            }
        };
        self.output_dir.join(filename)
    }
}

impl RecordSink for SqliteStore {
    type Error = StoreError;

    fn save_records(&mut self, subject: &str, records: &[FlashcardRecord]) -> Result<PathBuf, Self::Error> {
        let path = self.store_path(subject);
        if records.is_empty() {
            return Ok(path);
        }

        let mut conn = open_store_file(&path)?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO flashcards
                    (subject, subtopic, source_file, question, answer, difficulty, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.subject,
                    record.subtopic,
                    record.source_file,
                    record.question,
                    record.answer,
                    record.difficulty,
                    record.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))?;
        info!(
            path = %path.display(),
            saved = records.len(),
            total,
            "Saved flashcards"
        );
        Ok(path)
    }
}

/// Open (and initialize if new) one store file
fn open_store_file(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(include_str!("schema.sql"))?;
    Ok(conn)
}

/// Read every record from one store file, oldest first
pub fn read_store_file(path: &Path) -> Result<Vec<FlashcardRecord>, StoreError> {
    let conn = open_store_file(path)?;
    let mut stmt = conn.prepare(
        "SELECT subject, subtopic, source_file, question, answer, difficulty, created_at
         FROM flashcards ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (subject, subtopic, source_file, question, answer, difficulty, created_at) = row?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::InvalidData(format!("created_at '{}': {}", created_at, e)))?
            .with_timezone(&Utc);
        records.push(FlashcardRecord {
            subject,
            subtopic,
            source_file,
            question,
            answer,
            difficulty,
            created_at,
        });
    }
    Ok(records)
}

/// Whether `path` names a store file (backups excluded)
fn is_store_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == GLOBAL_STORE_FILE || name.ends_with(SUBJECT_STORE_SUFFIX))
}

/// Store files in `output_dir`, sorted by name
pub fn store_files(output_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let path = entry?.path();
        if is_store_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load records from every store file in `output_dir`
///
/// Files that cannot be read are skipped with a warning. Records sharing
/// (question, answer, subject, subtopic) across files collapse to the last
/// one read.
pub fn load_all_records(output_dir: &Path) -> Result<Vec<FlashcardRecord>, StoreError> {
    let mut all = Vec::new();
    for path in store_files(output_dir)? {
        match read_store_file(&path) {
            Ok(records) => {
                debug!(path = %path.display(), count = records.len(), "Loaded store file");
                all.extend(records);
            }
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
    }
    Ok(dedup_keep_last(all))
}

fn dedup_keep_last(records: Vec<FlashcardRecord>) -> Vec<FlashcardRecord> {
    let mut last_index: HashMap<(&str, &str, &str, &str), usize> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        last_index.insert(record.storage_key(), idx);
    }
    let keep: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| last_index.get(&record.storage_key()) == Some(&idx))
        .collect();

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

/// Treat blank filters as absent
fn filter_value(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Sorted, distinct, non-blank subjects across all store files
pub fn available_subjects(output_dir: &Path) -> Result<Vec<String>, StoreError> {
    let subjects: BTreeSet<String> = load_all_records(output_dir)?
        .into_iter()
        .map(|r| r.subject)
        .filter(|s| !s.trim().is_empty())
        .collect();
    Ok(subjects.into_iter().collect())
}

/// Sorted, distinct, non-blank subtopics, optionally within one subject
pub fn available_subtopics(output_dir: &Path, subject: Option<&str>) -> Result<Vec<String>, StoreError> {
    let subject = filter_value(subject);
    let subtopics: BTreeSet<String> = load_all_records(output_dir)?
        .into_iter()
        .filter(|r| subject.is_none_or(|s| r.subject == s))
        .map(|r| r.subtopic)
        .filter(|s| !s.trim().is_empty())
        .collect();
    Ok(subtopics.into_iter().collect())
}

/// Number of stored cards, optionally filtered by subject and subtopic
pub fn flashcard_count(
    output_dir: &Path,
    subject: Option<&str>,
    subtopic: Option<&str>,
) -> Result<usize, StoreError> {
    let subject = filter_value(subject);
    let subtopic = filter_value(subtopic);
    Ok(load_all_records(output_dir)?
        .iter()
        .filter(|r| subject.is_none_or(|s| r.subject == s))
        .filter(|r| subtopic.is_none_or(|s| r.subtopic == s))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsmith_domain::{CardPair, FileTask};
    use tempfile::TempDir;

    fn record(subject: &str, question: &str) -> FlashcardRecord {
        let task = FileTask::new("/n/x.md", subject, "General", "x.md");
        FlashcardRecord::from_pair(CardPair::new(question, "Some answer"), &task, Utc::now())
    }

    #[test]
    fn test_store_paths_per_mode() {
        let dir = TempDir::new().unwrap();
        let global = SqliteStore::open(dir.path(), StorageMode::Global).unwrap();
        assert_eq!(global.store_path("Biology"), dir.path().join("flashcards.db"));

        let per_subject = SqliteStore::open(dir.path(), StorageMode::PerSubject).unwrap();
        assert_eq!(
            per_subject.store_path("Biology"),
            dir.path().join("Biology_flashcards.db")
        );
        assert_eq!(
            per_subject.store_path("  "),
            dir.path().join("General_flashcards.db")
        );
    }

    #[test]
    fn test_open_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        SqliteStore::open(&nested, StorageMode::Global).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_dedup_keeps_last_position() {
        let a = record("Bio", "Question A?");
        let b = record("Bio", "Question B?");
        let mut a2 = a.clone();
        a2.source_file = "newer.md".to_string();

        let deduped = dedup_keep_last(vec![a, b, a2]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].question, "Question B?");
        assert_eq!(deduped[1].source_file, "newer.md");
    }

    #[test]
    fn test_is_store_file_ignores_backups() {
        let dir = TempDir::new().unwrap();
        for name in ["flashcards.db", "Bio_flashcards.db", "flashcards_backup_20240101_000000.db", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let names: Vec<String> = store_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Bio_flashcards.db", "flashcards.db"]);
    }
}
