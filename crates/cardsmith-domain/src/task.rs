//! FileTask module - one document queued for generation

use std::path::{Component, Path, PathBuf};

/// Subject and subtopic used when the folder layout does not provide one
pub const DEFAULT_CATEGORY: &str = "General";

/// A document to process, with its place in the notes hierarchy
///
/// The notes root is expected to look like `root/Subject/Subtopic/file` or
/// `root/Subject/file`. Files directly under the root land in
/// "General"/"General".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Full path to the document
    pub path: PathBuf,

    /// First folder below the root
    pub subject: String,

    /// Second folder below the root
    pub subtopic: String,

    /// File name, used as the key of generation results
    pub filename: String,
}

impl FileTask {
    /// Create a task with explicit metadata
    pub fn new(
        path: impl Into<PathBuf>,
        subject: impl Into<String>,
        subtopic: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            subject: subject.into(),
            subtopic: subtopic.into(),
            filename: filename.into(),
        }
    }

    /// Derive a task from a document path and the notes root it was found under
    ///
    /// Returns `None` when `path` is not below `root` or has no file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::FileTask;
    /// use std::path::Path;
    ///
    /// let root = Path::new("/notes");
    ///
    /// let task = FileTask::from_root(root, Path::new("/notes/Biology/Cells/mito.md")).unwrap();
    /// assert_eq!((task.subject.as_str(), task.subtopic.as_str()), ("Biology", "Cells"));
    ///
    /// let task = FileTask::from_root(root, Path::new("/notes/Biology/intro.md")).unwrap();
    /// assert_eq!((task.subject.as_str(), task.subtopic.as_str()), ("Biology", "General"));
    ///
    /// let task = FileTask::from_root(root, Path::new("/notes/todo.txt")).unwrap();
    /// assert_eq!((task.subject.as_str(), task.subtopic.as_str()), ("General", "General"));
    /// ```
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let filename = path.file_name()?.to_string_lossy().into_owned();

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let (subject, subtopic) = categorize(&parts);

        Some(Self {
            path: path.to_path_buf(),
            subject,
            subtopic,
            filename,
        })
    }
}

/// Map relative path components (file name included) to (subject, subtopic)
///
/// Two components give a subject with the default subtopic; three or more
/// use the second component as subtopic regardless of deeper nesting.
fn categorize(parts: &[String]) -> (String, String) {
    match parts.len() {
        0 | 1 => (DEFAULT_CATEGORY.to_string(), DEFAULT_CATEGORY.to_string()),
        2 => (parts[0].clone(), DEFAULT_CATEGORY.to_string()),
        _ => (parts[0].clone(), parts[1].clone()),
    }
}
