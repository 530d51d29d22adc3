//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use cardsmith_generator::GenerationStatistics;
use colored::*;
use serde::Serialize;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Stored card count for one subject/subtopic pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreCount {
    /// Subject
    pub subject: String,
    /// Subtopic
    pub subtopic: String,
    /// Number of cards
    pub cards: usize,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the statistics of one generation run.
    pub fn format_generation(&self, stats: &GenerationStatistics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats.total_flashcards.to_string()),
            OutputFormat::Table => Ok(self.format_generation_table(stats)),
        }
    }

    fn format_generation_table(&self, stats: &GenerationStatistics) -> String {
        if stats.total_flashcards == 0 {
            return self.colorize("No flashcards generated.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Source file", "Cards"]);
        for (file, count) in &stats.questions_by_file {
            builder.push_record([file.clone(), count.to_string()]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let subjects: Vec<String> = stats
            .questions_by_subject
            .iter()
            .map(|(subject, count)| format!("{} ({})", subject, count))
            .collect();

        format!(
            "{}\n{} flashcards from {} files ({:.1} per file)\nSubjects: {}",
            table,
            stats.total_flashcards,
            stats.files_processed,
            stats.average_cards_per_file,
            subjects.join(", ")
        )
    }

    /// Format stored card counts.
    pub fn format_store_counts(&self, counts: &[StoreCount]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(counts)?),
            OutputFormat::Quiet => Ok(counts.iter().map(|c| c.cards).sum::<usize>().to_string()),
            OutputFormat::Table => Ok(self.format_store_table(counts)),
        }
    }

    fn format_store_table(&self, counts: &[StoreCount]) -> String {
        if counts.is_empty() {
            return self.colorize("No flashcards found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Subject", "Subtopic", "Cards"]);
        for count in counts {
            builder.push_record([count.subject.clone(), count.subtopic.clone(), count.cards.to_string()]);
        }
        let total: usize = counts.iter().map(|c| c.cards).sum();
        builder.push_record(["Total".to_string(), String::new(), total.to_string()]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Progress line for one file of a batch.
    pub fn progress(&self, index: usize, total: usize, filename: &str) -> String {
        format!("{} {}", self.colorize(&format!("[{}/{}]", index, total), "cyan"), filename)
    }

    /// Format a saved store file.
    pub fn saved(&self, count: usize, path: &Path) -> String {
        self.success(&format!("Saved {} flashcard(s) to {}", count, path.display()))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_stats() -> GenerationStatistics {
        GenerationStatistics {
            total_flashcards: 3,
            files_processed: 2,
            questions_by_subject: BTreeMap::from([("Biology".to_string(), 3)]),
            questions_by_file: BTreeMap::from([
                ("cells.md".to_string(), 2),
                ("dna.txt".to_string(), 1),
            ]),
            average_cards_per_file: 1.5,
        }
    }

    fn sample_counts() -> Vec<StoreCount> {
        vec![
            StoreCount {
                subject: "Biology".to_string(),
                subtopic: "Cells".to_string(),
                cards: 4,
            },
            StoreCount {
                subject: "History".to_string(),
                subtopic: "General".to_string(),
                cards: 2,
            },
        ]
    }

    #[test]
    fn test_generation_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_generation(&sample_stats()).unwrap();
        assert!(output.contains("cells.md"));
        assert!(output.contains("3 flashcards from 2 files (1.5 per file)"));
        assert!(output.contains("Biology (3)"));
    }

    #[test]
    fn test_generation_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_generation(&sample_stats()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_flashcards"], 3);
        assert_eq!(value["questions_by_file"]["dna.txt"], 1);
    }

    #[test]
    fn test_empty_generation() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_generation(&GenerationStatistics::default())
            .unwrap();
        assert!(output.contains("No flashcards generated"));
    }

    #[test]
    fn test_store_counts_formats() {
        let table = Formatter::new(OutputFormat::Table, false)
            .format_store_counts(&sample_counts())
            .unwrap();
        assert!(table.contains("Subtopic"));
        assert!(table.contains("Total"));

        let quiet = Formatter::new(OutputFormat::Quiet, false)
            .format_store_counts(&sample_counts())
            .unwrap();
        assert_eq!(quiet, "6");
    }

    #[test]
    fn test_empty_store_counts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_store_counts(&[]).unwrap();
        assert!(output.contains("No flashcards found"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.progress(2, 5, "a.md"), "[2/5] a.md");
    }
}
