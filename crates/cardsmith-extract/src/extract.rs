//! Plain-text extraction from note files
//!
//! Supported: `.txt` and `.md` (UTF-8, Latin-1 fallback), `.docx` (Office
//! Open XML paragraphs) and `.pdf` (via `pdf-extract`).

use crate::error::ExtractionError;
use cardsmith_domain::TextSource;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Extensions (lower-case, with dot) that can be extracted
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".txt", ".md", ".docx", ".pdf"];

/// Upper bound on the uncompressed size of `word/document.xml`
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCX_BODY: &str = "word/document.xml";

/// Supported extensions as owned strings
pub fn supported_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

/// Lower-cased extension of `path` with a leading dot, if any
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Whether `path` is an existing file with a supported extension
pub fn is_supported_file(path: &Path) -> bool {
    path.is_file()
        && dotted_extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reads note files from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSource;

impl FileSystemSource {
    /// Create a new source
    pub fn new() -> Self {
        Self
    }
}

impl TextSource for FileSystemSource {
    type Error = ExtractionError;

    fn extract_text(&self, path: &Path) -> Result<String, Self::Error> {
        extract_text(path)
    }
}

/// Extract the text of one document, dispatching on its extension
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    if !path.exists() {
        return Err(ExtractionError::NotFound(path.to_path_buf()));
    }

    let ext = dotted_extension(path).unwrap_or_default();
    let text = match ext.as_str() {
        ".txt" | ".md" => read_plain_text(path)?,
        ".docx" => read_docx(path)?,
        ".pdf" => read_pdf(path)?,
        _ => {
            let shown = if ext.is_empty() { "(none)".to_string() } else { ext };
            return Err(ExtractionError::UnsupportedType(shown));
        }
    };

    debug!(path = %path.display(), chars = text.chars().count(), "Extracted text");
    Ok(text)
}

fn read_plain_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractionError::io(path, e))?;
    Ok(decode_utf8_or_latin1(bytes))
}

/// Decode as UTF-8, or as Latin-1 when the bytes are not valid UTF-8
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback cannot fail.
fn decode_utf8_or_latin1(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

fn read_pdf(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractionError::io(path, e))?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::decode(path, e.to_string()))
}

fn read_docx(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path).map_err(|e| ExtractionError::io(path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractionError::decode(path, e.to_string()))?;

    let entry = archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractionError::decode(path, format!("{}: {}", DOCX_BODY, e)))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractionError::io(path, e))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractionError::decode(
            path,
            format!("{} exceeds size limit", DOCX_BODY),
        ));
    }

    docx_paragraphs(&xml).map_err(|message| ExtractionError::decode(path, message))
}

/// Collect paragraph text from WordprocessingML
///
/// Runs (`w:t`) are concatenated, `w:tab` becomes a tab, and each non-blank
/// paragraph (`w:p`) becomes one line. Table cells hold paragraphs too, so
/// their text is included in document order.
fn docx_paragraphs(xml: &[u8]) -> Result<String, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut lines: Vec<String> = Vec::new();
    // Open `w:p` elements; text boxes nest whole paragraphs inside another
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                b"w:tab" => push_to_open(&mut open, "\t"),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"w:tab" {
                    push_to_open(&mut open, "\t");
                }
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| e.to_string())?;
                push_to_open(&mut open, &text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        if !paragraph.trim().is_empty() {
                            lines.push(paragraph);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(lines.join("\n"))
}

fn push_to_open(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_extensions() {
        let exts = supported_extensions();
        assert_eq!(exts.len(), 4);
        assert!(exts.contains(&".docx".to_string()));
    }

    #[test]
    fn test_is_supported_file_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let upper = dir.path().join("NOTES.MD");
        let other = dir.path().join("image.png");
        fs::write(&upper, "x").unwrap();
        fs::write(&other, "x").unwrap();

        assert!(is_supported_file(&upper));
        assert!(!is_supported_file(&other));
        assert!(!is_supported_file(&dir.path().join("missing.txt")));
        assert!(!is_supported_file(dir.path()));
    }

    #[test]
    fn test_read_utf8_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Ångström units — 10⁻¹⁰ m").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Ångström units — 10⁻¹⁰ m");
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.md");
        // "café" in Latin-1
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        assert_eq!(extract_text(&path).unwrap(), "café");
    }

    #[test]
    fn test_missing_file() {
        let result = extract_text(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(ExtractionError::NotFound(_))));
    }

    #[test]
    fn test_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slides.pptx");
        fs::write(&path, "x").unwrap();

        match extract_text(&path) {
            Err(ExtractionError::UnsupportedType(ext)) => assert_eq!(ext, ".pptx"),
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pdf_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, "not a pdf").unwrap();

        assert!(matches!(extract_text(&path), Err(ExtractionError::Decode { .. })));
    }

    #[test]
    fn test_invalid_zip_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        fs::write(&path, "not a zip").unwrap();

        assert!(matches!(extract_text(&path), Err(ExtractionError::Decode { .. })));
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Cell </w:t></w:r><w:r><w:t>biology</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>
    <w:p><w:r><w:t>Term</w:t><w:tab/><w:t>Definition &amp; use</w:t></w:r></w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>In a table</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
  </w:body>
</w:document>"#;

        let text = docx_paragraphs(xml).unwrap();
        assert_eq!(text, "Cell biology\nTerm\tDefinition & use\nIn a table");
    }

    #[test]
    fn test_docx_drawing_text_keeps_paragraph() {
        let xml = br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
    xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
    xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape">
  <w:body>
    <w:p>
      <w:r><w:t xml:space="preserve">Mitochondria </w:t></w:r>
      <w:r><w:drawing><a:graphic><a:graphicData>
        <a:p><a:r><a:t>Figure 1</a:t></a:r></a:p>
        <wps:txbx><w:txbxContent><w:p><w:r><w:t>Caption box</w:t></w:r></w:p></w:txbxContent></wps:txbx>
      </a:graphicData></a:graphic></w:drawing></w:r>
      <w:r><w:t>make ATP</w:t></w:r>
    </w:p>
  </w:body>
</w:document>"#;

        let text = docx_paragraphs(xml).unwrap();
        assert_eq!(text, "Caption box\nMitochondria make ATP");
    }
}
