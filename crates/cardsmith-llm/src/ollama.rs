//! Ollama Backend Implementation
//!
//! Talks to an Ollama server over its HTTP API. The server is probed with
//! `GET /api/tags` on construction; completions come from
//! `POST /api/generate` with streaming disabled.
//!
//! # Examples
//!
//! ```no_run
//! use cardsmith_llm::OllamaBackend;
//! use cardsmith_domain::{GenerationOptions, ModelBackend};
//!
//! let backend = OllamaBackend::connect("http://localhost:11434", "llama2").unwrap();
//! let text = backend.generate_text("Say hello", &GenerationOptions::default()).unwrap();
//! println!("{}", text);
//! ```

use crate::BackendError;
use cardsmith_domain::{GenerationOptions, ModelBackend};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model tag
pub const DEFAULT_MODEL: &str = "llama2";

/// Default timeout for generation requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Timeout for the reachability probe
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Ollama API backend
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    client: Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

impl OllamaBackend {
    /// Connect to an Ollama server with the default request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the server does not answer the probe request.
    pub fn connect(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        Self::connect_with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Connect to `http://localhost:11434`
    pub fn connect_default(model: impl Into<String>) -> Result<Self, BackendError> {
        Self::connect(DEFAULT_ENDPOINT, model)
    }

    /// Connect to an Ollama server
    ///
    /// A trailing `/` on the endpoint is ignored.
    pub fn connect_with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let model = model.into();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let backend = Self {
            endpoint,
            model,
            client,
        };
        backend.probe()?;

        info!(endpoint = %backend.endpoint, model = %backend.model, "Connected to Ollama");
        Ok(backend)
    }

    /// Endpoint this backend talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model tag used for generation
    pub fn model(&self) -> &str {
        &self.model
    }

    fn probe(&self) -> Result<(), BackendError> {
        let url = format!("{}/api/tags", self.endpoint);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .map_err(|e| BackendError::from_transport("Ollama server unreachable", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl ModelBackend for OllamaBackend {
    type Error = BackendError;

    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| BackendError::from_transport("Request failed", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        match body.get("response") {
            Some(Value::String(text)) => Ok(text.clone()),
            _ => Err(BackendError::InvalidResponse(
                "response field missing from Ollama reply".to_string(),
            )),
        }
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model)
    }
}
