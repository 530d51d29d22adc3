//! Core FlashcardGenerator implementation

use crate::chunking::TextChunker;
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::parser::parse_cards;
use crate::prompt::build_prompt;
use crate::retry::{FailureKind, RetryPolicy, RetryState};
use crate::types::GenerationResult;
use cardsmith_domain::{CardPair, FileTask, FlashcardRecord, ModelBackend, TextSource};
use chrono::Utc;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Progress callback: (1-based file index, total files, filename)
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// The FlashcardGenerator turns documents into flashcard records
///
/// Work is strictly sequential: one file, one chunk, one attempt at a time.
pub struct FlashcardGenerator<B, T>
where
    B: ModelBackend,
    T: TextSource,
{
    backend: B,
    source: T,
    config: GeneratorConfig,
}

impl<B, T> FlashcardGenerator<B, T>
where
    B: ModelBackend,
    T: TextSource,
    B::Error: Display,
    T::Error: Display,
{
    /// Create a new FlashcardGenerator
    pub fn new(backend: B, source: T, config: GeneratorConfig) -> Self {
        Self {
            backend,
            source,
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The model backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate up to `num_cards` cards from a block of text
    ///
    /// Blank text returns no cards without calling the backend. Each attempt
    /// that yields no cards or fails is retried after the configured delay.
    /// When attempts run out, a final failure is returned as
    /// `GeneratorError::Generation` while a final empty answer is `Ok([])`.
    pub fn generate_flashcards_from_text(
        &self,
        text: &str,
        num_cards: usize,
        max_retries: u32,
    ) -> Result<Vec<CardPair>, GeneratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(text, num_cards);
        debug!("Prompt length: {} chars", prompt.chars().count());

        let policy = RetryPolicy::new(max_retries, self.config.retry_delay());
        let mut state = RetryState::start();

        loop {
            state = match state {
                RetryState::Pending { attempt } => {
                    let outcome = self.attempt(&prompt);
                    policy.advance(attempt, outcome)
                }
                RetryState::RetryableFailure { attempt, reason } => {
                    match &reason {
                        FailureKind::Empty => warn!(
                            "Attempt {}/{} produced no flashcards, retrying",
                            attempt,
                            policy.max_attempts()
                        ),
                        FailureKind::Error(cause) => warn!(
                            "Attempt {}/{} failed: {}, retrying",
                            attempt,
                            policy.max_attempts(),
                            cause
                        ),
                    }
                    std::thread::sleep(policy.delay());
                    RetryState::Pending {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded(cards) => return Ok(cards),
                RetryState::Exhausted(FailureKind::Empty) => {
                    warn!(
                        "No flashcards after {} attempt(s)",
                        policy.max_attempts()
                    );
                    return Ok(Vec::new());
                }
                RetryState::Exhausted(FailureKind::Error(cause)) => {
                    return Err(GeneratorError::Generation {
                        attempts: policy.max_attempts(),
                        cause,
                    });
                }
            };
        }
    }

    /// One backend call plus parse, classified for the retry machine
    fn attempt(&self, prompt: &str) -> Result<Vec<CardPair>, FailureKind> {
        let response = self
            .backend
            .generate_text(prompt, &self.config.generation_options())
            .map_err(|e| FailureKind::Error(GeneratorError::Backend(e.to_string()).to_string()))?;

        debug!("Model response length: {} chars", response.chars().count());

        let cards = parse_cards(&response).map_err(|e| FailureKind::Error(e.to_string()))?;
        if cards.is_empty() {
            return Err(FailureKind::Empty);
        }
        Ok(cards)
    }

    /// Generate records for one document
    ///
    /// Never fails: extraction errors and chunks that exhaust their retries
    /// are logged and contribute no records.
    pub fn generate_flashcards_for_file(&self, task: &FileTask) -> Vec<FlashcardRecord> {
        let text = match self.source.extract_text(&task.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract text from {}: {}", task.path.display(), e);
                return Vec::new();
            }
        };

        let min_chars = self.config.min_chunk_size;
        if text.trim().chars().count() < min_chars {
            info!("Skipping {}: less than {} characters of text", task.filename, min_chars);
            return Vec::new();
        }

        let chunks = TextChunker::new(self.config.max_chars_per_chunk).chunk(&text);
        info!("Processing {} ({} chunks)", task.filename, chunks.len());

        let mut records = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            if chunk.trim().chars().count() < min_chars {
                debug!("Skipping chunk {}/{} of {}: too short", idx + 1, chunks.len(), task.filename);
                continue;
            }

            debug!("Processing chunk {}/{}", idx + 1, chunks.len());
            match self.generate_flashcards_from_text(
                chunk,
                self.config.cards_per_chunk,
                self.config.max_retries,
            ) {
                Ok(cards) => {
                    let created_at = Utc::now();
                    records.extend(
                        cards
                            .into_iter()
                            .map(|pair| FlashcardRecord::from_pair(pair, task, created_at)),
                    );
                }
                Err(e) => {
                    warn!("Chunk {}/{} of {} failed: {}", idx + 1, chunks.len(), task.filename, e);
                }
            }
        }

        info!("Generated {} flashcards from {}", records.len(), task.filename);
        records
    }

    /// Generate records for a batch of documents, in order
    pub fn generate_flashcards_for_files(
        &self,
        tasks: &[FileTask],
        mut progress: Option<ProgressFn<'_>>,
    ) -> GenerationResult {
        let total = tasks.len();
        let mut result = GenerationResult::new();
        let mut processed = 0;

        for (idx, task) in tasks.iter().enumerate() {
            if let Some(callback) = progress.as_deref_mut() {
                callback(idx + 1, total, &task.filename);
            }

            let records = self.generate_flashcards_for_file(task);
            if !records.is_empty() {
                processed += 1;
                result.append(task.filename.clone(), records);
            }
        }

        info!(
            "Generation complete: {}/{} files processed, {} flashcards",
            processed,
            total,
            result.total_records()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsmith_llm::MockBackend;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// Text source backed by an in-memory map
    #[derive(Default)]
    struct MemorySource {
        files: HashMap<PathBuf, String>,
    }

    impl MemorySource {
        fn with(mut self, path: &str, text: &str) -> Self {
            self.files.insert(PathBuf::from(path), text.to_string());
            self
        }
    }

    impl TextSource for MemorySource {
        type Error = String;

        fn extract_text(&self, path: &Path) -> Result<String, String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| format!("not found: {}", path.display()))
        }
    }

    const TWO_CARDS: &str = r#"[{"question": "What is osmosis?", "answer": "Diffusion of water"},
        {"question": "What is a membrane?", "answer": "A lipid bilayer"}]"#;

    fn fast_config() -> GeneratorConfig {
        GeneratorConfig {
            retry_delay_ms: 0,
            ..GeneratorConfig::default()
        }
    }

    fn generator(backend: MockBackend, source: MemorySource) -> FlashcardGenerator<MockBackend, MemorySource> {
        FlashcardGenerator::new(backend, source, fast_config())
    }

    fn long_text() -> String {
        "Osmosis moves water across a membrane from low to high solute concentration. ".repeat(3)
    }

    #[test]
    fn test_blank_text_skips_backend() {
        let backend = MockBackend::new(TWO_CARDS);
        let gen = generator(backend.clone(), MemorySource::default());

        assert!(gen.generate_flashcards_from_text("  \n ", 8, 3).unwrap().is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_success_on_first_attempt() {
        let backend = MockBackend::new(TWO_CARDS);
        let gen = generator(backend.clone(), MemorySource::default());

        let cards = gen.generate_flashcards_from_text("Some text.", 8, 3).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_failure_then_success() {
        let backend = MockBackend::new(TWO_CARDS);
        backend.push_error("connection reset");
        let gen = generator(backend.clone(), MemorySource::default());

        let cards = gen.generate_flashcards_from_text("Some text.", 8, 3).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn test_always_failing_exhausts_attempts() {
        let backend = MockBackend::failing("down");
        let gen = generator(backend.clone(), MemorySource::default());

        let result = gen.generate_flashcards_from_text("Some text.", 8, 3);
        assert!(matches!(result, Err(GeneratorError::Generation { attempts: 3, .. })));
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_unparseable_response_exhausts_attempts() {
        let backend = MockBackend::new("Sorry, I cannot help with that.");
        let gen = generator(backend.clone(), MemorySource::default());

        let result = gen.generate_flashcards_from_text("Some text.", 8, 3);
        match result {
            Err(GeneratorError::Generation { attempts, cause }) => {
                assert_eq!(attempts, 3);
                assert!(cause.contains("No JSON array"));
            }
            other => panic!("Expected Generation error, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_always_empty_returns_no_cards() {
        let backend = MockBackend::new("[]");
        let gen = generator(backend.clone(), MemorySource::default());

        let cards = gen.generate_flashcards_from_text("Some text.", 8, 3).unwrap();
        assert!(cards.is_empty());
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_error_then_final_empty_is_ok() {
        let backend = MockBackend::new("[]");
        backend.push_error("timeout");
        let gen = generator(backend.clone(), MemorySource::default());

        assert!(gen.generate_flashcards_from_text("Some text.", 8, 2).unwrap().is_empty());
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let backend = MockBackend::failing("down");
        let gen = generator(backend.clone(), MemorySource::default());

        let result = gen.generate_flashcards_from_text("Some text.", 8, 0);
        assert!(matches!(result, Err(GeneratorError::Generation { attempts: 1, .. })));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_backend_receives_configured_options() {
        let backend = MockBackend::new(TWO_CARDS);
        let config = GeneratorConfig {
            temperature: 0.2,
            max_tokens: 300,
            retry_delay_ms: 0,
            ..GeneratorConfig::default()
        };
        let gen = FlashcardGenerator::new(backend.clone(), MemorySource::default(), config);

        gen.generate_flashcards_from_text("Some text.", 8, 1).unwrap();
        let options = backend.last_options().unwrap();
        assert_eq!(options.temperature, 0.2);
        assert_eq!(options.max_tokens, 300);
    }

    #[test]
    fn test_file_records_carry_metadata() {
        let source = MemorySource::default().with("/notes/Bio/Cells/osmosis.md", &long_text());
        let gen = generator(MockBackend::new(TWO_CARDS), source);
        let task = FileTask::new("/notes/Bio/Cells/osmosis.md", "Bio", "Cells", "osmosis.md");

        let records = gen.generate_flashcards_for_file(&task);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.subject, "Bio");
            assert_eq!(record.subtopic, "Cells");
            assert_eq!(record.source_file, "osmosis.md");
            assert!(record.difficulty.is_empty());
        }
    }

    #[test]
    fn test_short_file_is_skipped() {
        let backend = MockBackend::new(TWO_CARDS);
        let source = MemorySource::default().with("/notes/short.md", "Too short to bother.");
        let gen = generator(backend.clone(), source);
        let task = FileTask::new("/notes/short.md", "General", "General", "short.md");

        assert!(gen.generate_flashcards_for_file(&task).is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_extraction_failure_yields_nothing() {
        let backend = MockBackend::new(TWO_CARDS);
        let gen = generator(backend.clone(), MemorySource::default());
        let task = FileTask::new("/missing.md", "General", "General", "missing.md");

        assert!(gen.generate_flashcards_for_file(&task).is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_failing_chunk_does_not_stop_file() {
        let sentence = "Water moves across membranes by osmosis in living cells every day.";
        let text = vec![sentence; 6].join(" ");
        let source = MemorySource::default().with("/n/osmosis.md", &text);

        let backend = MockBackend::new(TWO_CARDS);
        backend.push_error("first chunk fails");
        let config = GeneratorConfig {
            max_chars_per_chunk: 250,
            min_chunk_size: 50,
            max_retries: 1,
            retry_delay_ms: 0,
            ..GeneratorConfig::default()
        };
        let gen = FlashcardGenerator::new(backend.clone(), source, config);
        let task = FileTask::new("/n/osmosis.md", "General", "General", "osmosis.md");

        // 6 sentences of 66 chars pack three to a chunk: two chunks
        let records = gen.generate_flashcards_for_file(&task);
        assert_eq!(backend.call_count(), 2);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_batch_reports_progress_and_skips_empty_files() {
        let source = MemorySource::default()
            .with("/n/Bio/a.md", &long_text())
            .with("/n/Bio/b.md", "tiny")
            .with("/n/Chem/a.md", &long_text());
        let gen = generator(MockBackend::new(TWO_CARDS), source);
        let tasks = vec![
            FileTask::new("/n/Bio/a.md", "Bio", "General", "a.md"),
            FileTask::new("/n/Bio/b.md", "Bio", "General", "b.md"),
            FileTask::new("/n/Chem/a.md", "Chem", "General", "a.md"),
        ];

        let mut seen = Vec::new();
        let mut progress = |i: usize, total: usize, name: &str| seen.push((i, total, name.to_string()));
        let result = gen.generate_flashcards_for_files(&tasks, Some(&mut progress));

        assert_eq!(
            seen,
            vec![
                (1, 3, "a.md".to_string()),
                (2, 3, "b.md".to_string()),
                (3, 3, "a.md".to_string()),
            ]
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("a.md").map(|r| r.len()), Some(4));
        assert!(result.get("b.md").is_none());
    }

    #[test]
    fn test_boxed_backend_works() {
        let backend: Box<dyn ModelBackend<Error = cardsmith_llm::BackendError>> =
            Box::new(MockBackend::new(TWO_CARDS));
        let gen = FlashcardGenerator::new(backend, MemorySource::default(), fast_config());
        assert_eq!(gen.generate_flashcards_from_text("Text.", 2, 1).unwrap().len(), 2);
    }
}
