//! Text chunking for large documents
//!
//! Text is split into sentences and packed greedily into chunks under a soft
//! character budget. Text without any sentence boundary (lists, code, notes
//! without punctuation) is packed line by line instead, with blank lines
//! acting as paragraph breaks. A single sentence or line longer than the
//! budget is never split.
//!
//! Lengths are counted in characters, not bytes.

/// Chunks text under a soft character budget
pub struct TextChunker {
    max_chars: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.max_chars)
    }
}

/// Split `text` into ordered chunks of at most `max_chars` characters
///
/// # Examples
///
/// ```
/// use cardsmith_generator::chunk_text;
///
/// let chunks = chunk_text("Cells divide. Mitochondria make ATP!", 2000);
/// assert_eq!(chunks, vec!["Cells divide. Mitochondria make ATP!"]);
///
/// assert!(chunk_text("   ", 2000).is_empty());
/// ```
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let (sentences, found_boundary) = split_sentences(text);
    if found_boundary {
        pack_sentences(&sentences, max_chars)
    } else {
        pack_lines(text, max_chars)
    }
}

/// Split at `.`, `!` or `?` followed by whitespace
///
/// Returns the trimmed, non-empty sentences and whether any boundary was seen.
fn split_sentences(text: &str) -> (Vec<String>, bool) {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut found_boundary = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary =
            matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|next| next.is_whitespace());
        if at_boundary {
            found_boundary = true;
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    (sentences, found_boundary)
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn pack_sentences(sentences: &[String], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let len = sentence.chars().count();

        if !current.is_empty() && current_len + len + 1 > max_chars {
            push_trimmed(&mut chunks, &current);
            current.clear();
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += len;
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

fn pack_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line = line.trim_end();

        // Paragraph break
        if line.is_empty() {
            flush_lines(&mut chunks, &mut current);
            current_len = 0;
            continue;
        }

        let cost = line.chars().count() + 1;
        if !current.is_empty() && current_len + cost > max_chars {
            flush_lines(&mut chunks, &mut current);
            current_len = 0;
        }
        current.push(line);
        current_len += cost;
    }
    flush_lines(&mut chunks, &mut current);

    chunks
}

fn flush_lines(chunks: &mut Vec<String>, lines: &mut Vec<&str>) {
    if !lines.is_empty() {
        push_trimmed(chunks, &lines.join("\n"));
        lines.clear();
    }
}
