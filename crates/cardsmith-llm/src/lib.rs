//! Cardsmith Model Backend Layer
//!
//! Pluggable language-model backends implementing the `ModelBackend` trait
//! from `cardsmith-domain`. All backends share one capability: turn a prompt
//! into a raw completion string.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic scripted backend for testing
//! - `OllamaBackend`: Ollama server (`/api/generate`)
//! - `HttpBackend`: Any JSON-over-HTTP endpoint with a configurable payload
//! - `LocalPipelineBackend`: In-process ONNX causal LM (feature `local-onnx`)
//!
//! Server-backed variants probe their endpoint on construction and the local
//! variant loads its model on construction, so a misconfigured backend fails
//! before any generation is attempted.
//!
//! # Examples
//!
//! ```
//! use cardsmith_llm::MockBackend;
//! use cardsmith_domain::{GenerationOptions, ModelBackend};
//!
//! let backend = MockBackend::new("Hello from the model!");
//! let result = backend.generate_text("test prompt", &GenerationOptions::default()).unwrap();
//! assert_eq!(result, "Hello from the model!");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod http;
#[cfg(feature = "local-onnx")]
pub mod local;
pub mod ollama;

use cardsmith_domain::{GenerationOptions, ModelBackend};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use config::BackendConfig;
pub use http::HttpBackend;
#[cfg(feature = "local-onnx")]
pub use local::LocalPipelineBackend;
pub use ollama::OllamaBackend;

/// A backend selected at runtime from configuration
pub type DynBackend = Box<dyn ModelBackend<Error = BackendError>>;

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request exceeded the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response envelope did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available on the server
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Local model could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// Backend configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Classify a transport error from the HTTP client
    pub(crate) fn from_transport(context: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            BackendError::Timeout(format!("{}: {}", context, error))
        } else {
            BackendError::Connection(format!("{}: {}", context, error))
        }
    }
}

/// Build the backend described by `config`
///
/// Server-backed variants are probed before this returns; the local variant
/// loads its model. Any failure here is fatal for the backend instance.
pub fn create_backend(config: &BackendConfig) -> Result<DynBackend, BackendError> {
    config.validate().map_err(BackendError::Config)?;

    match config {
        BackendConfig::Ollama {
            endpoint,
            model,
            timeout_secs,
        } => {
            let backend = OllamaBackend::connect_with_timeout(
                endpoint.as_str(),
                model.as_str(),
                Duration::from_secs(*timeout_secs),
            )?;
            Ok(Box::new(backend))
        }
        BackendConfig::Http {
            api_url,
            headers,
            payload_template,
            timeout_secs,
        } => {
            let backend = HttpBackend::connect(
                api_url.as_str(),
                headers,
                payload_template.clone(),
                Duration::from_secs(*timeout_secs),
            )?;
            Ok(Box::new(backend))
        }
        #[cfg(feature = "local-onnx")]
        BackendConfig::Local {
            model_dir,
            eos_token,
            max_context_tokens,
        } => {
            let backend =
                LocalPipelineBackend::load(model_dir, eos_token.as_deref(), *max_context_tokens)?;
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "local-onnx"))]
        BackendConfig::Local { .. } => Err(BackendError::Config(
            "local backend requires building with the `local-onnx` feature".to_string(),
        )),
    }
}

/// Mock backend for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Queued responses are consumed first, in order; then per-prompt responses;
/// then the default.
///
/// # Examples
///
/// ```
/// use cardsmith_llm::MockBackend;
/// use cardsmith_domain::{GenerationOptions, ModelBackend};
///
/// let options = GenerationOptions::default();
///
/// // Fail once, then succeed
/// let backend = MockBackend::new("[]");
/// backend.push_error("connection reset");
/// backend.push_response(r#"[{"question": "Q?", "answer": "A"}]"#);
/// assert!(backend.generate_text("p", &options).is_err());
/// assert!(backend.generate_text("p", &options).unwrap().contains("Q?"));
/// assert_eq!(backend.generate_text("p", &options).unwrap(), "[]");
/// assert_eq!(backend.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: Result<String, String>,
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    queue: Arc<Mutex<VecDeque<Result<String, String>>>>,
    call_count: Arc<Mutex<usize>>,
    last_options: Arc<Mutex<Option<GenerationOptions>>>,
}

impl MockBackend {
    /// Create a new MockBackend with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_default(Ok(response.into()))
    }

    /// Create a MockBackend whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(Err(message.into()))
    }

    fn with_default(default_response: Result<String, String>) -> Self {
        Self {
            default_response,
            responses: Arc::new(Mutex::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_options: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), Ok(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), Err("Mock error".to_string()));
    }

    /// Queue a response for the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Ok(response.into()));
    }

    /// Queue a failure for the next unanswered call
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(Err(message.into()));
    }

    /// Get the number of times generate_text was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    /// Options passed to the most recent call
    pub fn last_options(&self) -> Option<GenerationOptions> {
        *lock(&self.last_options)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl ModelBackend for MockBackend {
    type Error = BackendError;

    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        *lock(&self.call_count) += 1;
        *lock(&self.last_options) = Some(*options);

        let scripted = lock(&self.queue).pop_front();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None => lock(&self.responses)
                .get(prompt)
                .cloned()
                .unwrap_or_else(|| self.default_response.clone()),
        };

        outcome.map_err(BackendError::Other)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

// A poisoned lock only means another test thread panicked mid-call; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GenerationOptions {
        GenerationOptions::default()
    }

    #[test]
    fn test_mock_backend_default() {
        let backend = MockBackend::new("Test response");
        let result = backend.generate_text("any prompt", &options());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_backend_specific_responses() {
        let mut backend = MockBackend::default();
        backend.add_response("hello", "world");
        backend.add_response("foo", "bar");

        assert_eq!(backend.generate_text("hello", &options()).unwrap(), "world");
        assert_eq!(backend.generate_text("foo", &options()).unwrap(), "bar");
        assert_eq!(
            backend.generate_text("unknown", &options()).unwrap(),
            "Default mock response"
        );
    }

    #[test]
    fn test_mock_backend_call_count() {
        let backend = MockBackend::new("test");
        assert_eq!(backend.call_count(), 0);

        backend.generate_text("prompt1", &options()).unwrap();
        backend.generate_text("prompt2", &options()).unwrap();
        assert_eq!(backend.call_count(), 2);

        backend.reset_call_count();
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_mock_backend_error() {
        let mut backend = MockBackend::default();
        backend.add_error("bad prompt");

        let result = backend.generate_text("bad prompt", &options());
        assert!(matches!(result.unwrap_err(), BackendError::Other(_)));
    }

    #[test]
    fn test_mock_backend_failing_always_errors() {
        let backend = MockBackend::failing("down");
        for _ in 0..3 {
            let err = backend.generate_text("p", &options()).unwrap_err();
            assert_eq!(err.to_string(), "Backend error: down");
        }
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_mock_backend_queue_takes_precedence() {
        let mut backend = MockBackend::new("default");
        backend.add_response("p", "per-prompt");
        backend.push_response("queued");

        assert_eq!(backend.generate_text("p", &options()).unwrap(), "queued");
        assert_eq!(backend.generate_text("p", &options()).unwrap(), "per-prompt");
    }

    #[test]
    fn test_mock_backend_records_options() {
        let backend = MockBackend::new("x");
        let opts = GenerationOptions {
            temperature: 0.1,
            max_tokens: 64,
        };
        backend.generate_text("p", &opts).unwrap();
        assert_eq!(backend.last_options(), Some(opts));
    }

    #[test]
    fn test_mock_backend_clone_shares_state() {
        let backend1 = MockBackend::new("test");
        let backend2 = backend1.clone();

        backend1.generate_text("test", &options()).unwrap();

        assert_eq!(backend1.call_count(), 1);
        assert_eq!(backend2.call_count(), 1);
    }

    #[test]
    fn test_create_backend_rejects_invalid_config() {
        let config = BackendConfig::Http {
            api_url: String::new(),
            headers: Default::default(),
            payload_template: Default::default(),
            timeout_secs: 60,
        };
        let result = create_backend(&config);
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[test]
    fn test_create_backend_unreachable_ollama_fails_fast() {
        let config = BackendConfig::Ollama {
            endpoint: "http://127.0.0.1:9".to_string(),
            model: "llama2".to_string(),
            timeout_secs: 5,
        };
        let result = create_backend(&config);
        assert!(matches!(
            result,
            Err(BackendError::Connection(_)) | Err(BackendError::Timeout(_))
        ));
    }

    #[cfg(not(feature = "local-onnx"))]
    #[test]
    fn test_create_local_backend_without_feature() {
        let config = BackendConfig::Local {
            model_dir: "/models/tiny".into(),
            eos_token: None,
            max_context_tokens: 2048,
        };
        let result = create_backend(&config);
        assert!(matches!(result, Err(BackendError::Config(_))));
    }
}
