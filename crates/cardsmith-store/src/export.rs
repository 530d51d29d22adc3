//! Store file backups and CSV export

use crate::StoreError;
use cardsmith_domain::FlashcardRecord;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column headers of exported spreadsheets
pub const CSV_HEADERS: [&str; 7] = [
    "Subject",
    "Subtopic",
    "SourceFile",
    "Question",
    "Answer",
    "Difficulty",
    "CreatedAt",
];

/// Copy `path` to `<stem>_backup_<YYYYmmdd_HHMMSS><ext>` next to it
///
/// Returns the backup path, or `path` unchanged when there is nothing to
/// back up.
pub fn backup_store_file(path: &Path) -> Result<PathBuf, StoreError> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let backup = path.with_file_name(format!("{}_backup_{}{}", stem, timestamp, ext));
    std::fs::copy(path, &backup)?;
    info!("Backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

/// Write records as CSV with a header row, returning the number of rows
pub fn export_csv(records: &[FlashcardRecord], path: &Path) -> Result<usize, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        let created_at = record.created_at.to_rfc3339();
        writer.write_record([
            record.subject.as_str(),
            record.subtopic.as_str(),
            record.source_file.as_str(),
            record.question.as_str(),
            record.answer.as_str(),
            record.difficulty.as_str(),
            created_at.as_str(),
        ])?;
    }
    writer.flush()?;

    info!("Exported {} flashcards to {}", records.len(), path.display());
    Ok(records.len())
}
