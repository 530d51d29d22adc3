//! Configuration for the generator

use crate::error::GeneratorError;
use cardsmith_domain::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the FlashcardGenerator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Soft character budget per chunk
    pub max_chars_per_chunk: usize,

    /// Flashcards requested per chunk
    pub cards_per_chunk: usize,

    /// Documents and chunks shorter than this (trimmed, in characters) are skipped
    pub min_chunk_size: usize,

    /// Attempts per chunk, including the first
    pub max_retries: u32,

    /// Pause between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Sampling temperature passed to the backend
    pub temperature: f32,

    /// Generated token limit passed to the backend
    pub max_tokens: u32,
}

impl GeneratorConfig {
    /// Get the retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Backend options derived from this configuration
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.max_chars_per_chunk == 0 {
            return Err(GeneratorError::Config("max_chars_per_chunk must be greater than 0".to_string()));
        }
        if self.cards_per_chunk == 0 {
            return Err(GeneratorError::Config("cards_per_chunk must be greater than 0".to_string()));
        }
        if self.min_chunk_size > self.max_chars_per_chunk {
            return Err(GeneratorError::Config("min_chunk_size cannot exceed max_chars_per_chunk".to_string()));
        }
        if self.max_retries == 0 {
            return Err(GeneratorError::Config("max_retries must be greater than 0".to_string()));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(GeneratorError::Config("temperature must be a non-negative number".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(GeneratorError::Config("max_tokens must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_chars_per_chunk: 2000,
            cards_per_chunk: 8,
            min_chunk_size: 100,
            max_retries: 3,
            retry_delay_ms: 1000,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl GeneratorConfig {
    /// Quick preset: fewer cards, one retry, short pause
    pub fn quick() -> Self {
        Self {
            cards_per_chunk: 4,
            max_retries: 2,
            retry_delay_ms: 250,
            max_tokens: 512,
            ..Self::default()
        }
    }

    /// Thorough preset: smaller chunks, more cards and more patience
    pub fn thorough() -> Self {
        Self {
            max_chars_per_chunk: 1500,
            cards_per_chunk: 12,
            max_retries: 5,
            retry_delay_ms: 2000,
            temperature: 0.5,
            max_tokens: 2048,
            ..Self::default()
        }
    }

    /// Look up a preset by name ("default", "quick", "thorough")
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "quick" => Some(Self::quick()),
            "thorough" => Some(Self::thorough()),
            _ => None,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, GeneratorError> {
        toml::from_str(toml_str)
            .map_err(|e| GeneratorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, GeneratorError> {
        toml::to_string_pretty(self)
            .map_err(|e| GeneratorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
