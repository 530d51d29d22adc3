//! Generate command implementation.

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cardsmith_domain::{FileTask, FlashcardRecord, ModelBackend, RecordSink};
use cardsmith_extract::{scan_notes, FileSystemSource};
use cardsmith_generator::{
    generation_statistics, prepare_for_persistence, FlashcardGenerator, GenerationStatistics,
    GeneratorConfig,
};
use cardsmith_llm::create_backend;
use cardsmith_store::{backup_store_file, store_files, SqliteStore, StorageMode};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of one generate run.
#[derive(Debug)]
pub struct GenerateSummary {
    /// Statistics over the generated (unfiltered) records
    pub statistics: GenerationStatistics,

    /// Store files written and how many records went to each
    pub saved: Vec<(PathBuf, usize)>,

    /// Subjects whose records could not be saved, with the error
    pub failed: Vec<(String, String)>,
}

/// Execute the generate command.
pub fn execute_generate(args: GenerateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let generator_config = resolve_generator_config(&args, &config.generator)?;
    let backend_config = config.active_backend()?;
    let mode = if args.per_subject {
        StorageMode::PerSubject
    } else {
        config.store.mode
    };

    let tasks = scan_notes(&args.notes_dir)?;
    if tasks.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No supported notes found under {}", args.notes_dir.display()))
        );
        return Ok(());
    }

    // Fail before any work if the backend is unreachable or misconfigured
    let backend = create_backend(backend_config)?;
    info!("Using backend {}", backend.describe());

    let mut store = SqliteStore::open(&args.output, mode)?;
    if args.backup {
        for path in store_files(store.output_dir())? {
            let backup = backup_store_file(&path)?;
            println!("{}", formatter.info(&format!("Backed up {}", backup.display())));
        }
    }

    let summary = generate_into_store(backend, &tasks, generator_config, &mut store, formatter)?;

    for (path, count) in &summary.saved {
        println!("{}", formatter.saved(*count, path));
    }
    for (subject, error) in &summary.failed {
        println!("{}", formatter.warning(&format!("Error saving {}: {}", subject, error)));
    }
    println!("{}", formatter.format_generation(&summary.statistics)?);
    Ok(())
}

/// Apply preset and flag overrides on top of the configured generator settings.
fn resolve_generator_config(args: &GenerateArgs, base: &GeneratorConfig) -> Result<GeneratorConfig> {
    let mut config = match &args.preset {
        Some(name) => GeneratorConfig::preset(name)
            .ok_or_else(|| CliError::InvalidInput(format!("Unknown preset '{}'", name)))?,
        None => base.clone(),
    };

    if let Some(cards) = args.cards_per_chunk {
        config.cards_per_chunk = cards;
    }
    if let Some(retries) = args.max_retries {
        config.max_retries = retries;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }

    config
        .validate()
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    Ok(config)
}

/// Run the pipeline over `tasks` and persist the cleaned records per subject.
///
/// A subject that fails to save is logged and reported in the summary; the
/// remaining subjects are still saved.
pub fn generate_into_store<B>(
    backend: B,
    tasks: &[FileTask],
    config: GeneratorConfig,
    store: &mut SqliteStore,
    formatter: &Formatter,
) -> Result<GenerateSummary>
where
    B: ModelBackend,
    B::Error: Display,
{
    let generator = FlashcardGenerator::new(backend, FileSystemSource::new(), config);

    let mut progress = |index: usize, total: usize, filename: &str| {
        eprintln!("{}", formatter.progress(index, total, filename));
    };
    let result = generator.generate_flashcards_for_files(tasks, Some(&mut progress));
    let statistics = generation_statistics(&result);

    let mut by_subject: BTreeMap<String, Vec<FlashcardRecord>> = BTreeMap::new();
    for record in prepare_for_persistence(result.into_records()) {
        by_subject.entry(record.subject.clone()).or_default().push(record);
    }

    let mut saved = Vec::with_capacity(by_subject.len());
    let mut failed = Vec::new();
    for (subject, records) in &by_subject {
        match store.save_records(subject, records) {
            Ok(path) => saved.push((path, records.len())),
            Err(e) => {
                warn!("Failed to save {} flashcards for {}: {}", records.len(), subject, e);
                failed.push((subject.clone(), e.to_string()));
            }
        }
    }

    Ok(GenerateSummary {
        statistics,
        saved,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn args(preset: Option<&str>) -> GenerateArgs {
        GenerateArgs {
            notes_dir: PathBuf::from("notes"),
            output: PathBuf::from("output"),
            per_subject: false,
            preset: preset.map(str::to_string),
            cards_per_chunk: None,
            max_retries: None,
            temperature: None,
            backup: false,
        }
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let mut args = args(None);
        args.cards_per_chunk = Some(3);
        args.temperature = Some(0.2);

        let config = resolve_generator_config(&args, &GeneratorConfig::default()).unwrap();
        assert_eq!(config.cards_per_chunk, 3);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_preset_replaces_config() {
        let config = resolve_generator_config(&args(Some("thorough")), &GeneratorConfig::default()).unwrap();
        assert_eq!(config, GeneratorConfig::thorough());
    }

    #[test]
    fn test_unknown_preset() {
        let result = resolve_generator_config(&args(Some("turbo")), &GeneratorConfig::default());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut args = args(None);
        args.max_retries = Some(0);
        let result = resolve_generator_config(&args, &GeneratorConfig::default());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_notes_dir_is_error() {
        let mut args = args(None);
        args.notes_dir = PathBuf::from("/no/such/notes");
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = execute_generate(args, &Config::default(), &formatter);
        assert!(matches!(result, Err(CliError::Extraction(_))));
    }
}
