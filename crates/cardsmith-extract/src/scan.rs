//! Discovery of note files under a notes root

use crate::error::ExtractionError;
use crate::extract::is_supported_file;
use cardsmith_domain::FileTask;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Find every supported document below `root`
///
/// The walk is recursive and sorted by file name at each level, so the
/// result is deterministic. Subject and subtopic come from the folder
/// layout relative to `root`.
pub fn scan_notes(root: &Path) -> Result<Vec<FileTask>, ExtractionError> {
    if !root.is_dir() {
        return Err(ExtractionError::NotFound(root.to_path_buf()));
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ExtractionError::Io {
                path,
                source: e.into(),
            }
        })?;

        let path = entry.path();
        if !is_supported_file(path) {
            continue;
        }

        match FileTask::from_root(root, path) {
            Some(task) => {
                debug!(path = %path.display(), subject = %task.subject, subtopic = %task.subtopic, "Found note");
                tasks.push(task);
            }
            None => debug!(path = %path.display(), "Skipping path outside notes root"),
        }
    }

    info!("Found {} note files under {}", tasks.len(), root.display());
    Ok(tasks)
}
