//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cardsmith - Turn study notes into flashcards with a language model.
#[derive(Debug, Parser)]
#[command(name = "cardsmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CARDSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate flashcards from a folder of notes
    Generate(GenerateArgs),

    /// Show how many flashcards are stored per subject and subtopic
    Stats(StatsArgs),

    /// Export stored flashcards to a CSV spreadsheet
    Export(ExportArgs),

    /// Manage backend profiles
    Profile(ProfileArgs),

    /// Inspect the configuration file
    Config(ConfigArgs),
}

/// Arguments for the generate command.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Root folder of the notes (`<subject>/<subtopic>/...`)
    pub notes_dir: PathBuf,

    /// Directory receiving the flashcard store
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Write one store file per subject
    #[arg(long)]
    pub per_subject: bool,

    /// Generator preset (quick, thorough)
    #[arg(long)]
    pub preset: Option<String>,

    /// Flashcards requested per chunk
    #[arg(long)]
    pub cards_per_chunk: Option<usize>,

    /// Attempts per chunk
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Back up existing store files before writing
    #[arg(long)]
    pub backup: bool,
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Directory holding the flashcard store
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Only count this subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Only count this subtopic
    #[arg(short = 't', long)]
    pub subtopic: Option<String>,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// CSV file to write
    pub file: PathBuf,

    /// Directory holding the flashcard store
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Only export this subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Only export this subtopic
    #[arg(short = 't', long)]
    pub subtopic: Option<String>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update an Ollama profile
    SetOllama {
        /// Profile name
        name: String,
        /// Model tag
        #[arg(short, long, default_value = "llama2")]
        model: String,
        /// Ollama base URL
        #[arg(short, long, default_value = "http://localhost:11434")]
        endpoint: String,
        /// Request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Create or update a generic HTTP profile
    SetHttp {
        /// Profile name
        name: String,
        /// Completion endpoint
        #[arg(short, long)]
        url: String,
        /// Extra header as NAME=VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Create or update a local ONNX model profile
    SetLocal {
        /// Profile name
        name: String,
        /// Directory holding model.onnx and tokenizer.json
        #[arg(long)]
        model_dir: PathBuf,
        /// End-of-sequence token
        #[arg(long)]
        eos_token: Option<String>,
        /// Context window in tokens
        #[arg(long, default_value = "2048")]
        max_context: usize,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

/// Arguments for configuration inspection.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
