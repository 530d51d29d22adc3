//! Integration tests for note discovery and extraction on a real directory tree

use cardsmith_domain::TextSource;
use cardsmith_extract::{scan_notes, ExtractionError, FileSystemSource};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(b"<Types/>").unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn notes_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("Biology/Cells/Week1")).unwrap();
    fs::create_dir_all(root.join("History")).unwrap();

    fs::write(root.join("inbox.txt"), "Loose note at the root.").unwrap();
    fs::write(root.join("History/ww2.md"), "# WW2\nThe war ended in 1945.").unwrap();
    fs::write(root.join("History/map.png"), [0u8, 1, 2]).unwrap();
    fs::write(
        root.join("Biology/Cells/Week1/osmosis.TXT"),
        "Osmosis is the diffusion of water.",
    )
    .unwrap();
    write_docx(
        &root.join("Biology/Cells/mitochondria.docx"),
        &["Mitochondria", "They make ATP."],
    );

    dir
}

#[test]
fn test_scan_derives_subject_and_subtopic() {
    let dir = notes_tree();
    let tasks = scan_notes(dir.path()).unwrap();

    let summary: Vec<(String, String, String)> = tasks
        .iter()
        .map(|t| (t.subject.clone(), t.subtopic.clone(), t.filename.clone()))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("Biology".into(), "Cells".into(), "osmosis.TXT".into()),
            ("Biology".into(), "Cells".into(), "mitochondria.docx".into()),
            ("History".into(), "General".into(), "ww2.md".into()),
            ("General".into(), "General".into(), "inbox.txt".into()),
        ]
    );
}

#[test]
fn test_extract_every_scanned_file() {
    let dir = notes_tree();
    let source = FileSystemSource::new();

    for task in scan_notes(dir.path()).unwrap() {
        let text = source.extract_text(&task.path).unwrap();
        assert!(!text.trim().is_empty(), "{} extracted no text", task.filename);
    }
}

#[test]
fn test_docx_text_is_one_line_per_paragraph() {
    let dir = notes_tree();
    let path = dir.path().join("Biology/Cells/mitochondria.docx");

    let text = FileSystemSource::new().extract_text(&path).unwrap();
    assert_eq!(text, "Mitochondria\nThey make ATP.");
}

#[test]
fn test_docx_without_body_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.docx");
    let file = fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<x/>").unwrap();
    zip.finish().unwrap();

    let result = FileSystemSource::new().extract_text(&path);
    assert!(matches!(result, Err(ExtractionError::Decode { .. })));
}
