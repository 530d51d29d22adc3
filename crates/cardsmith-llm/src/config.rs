//! Backend configuration
//!
//! A `BackendConfig` names one backend variant and everything needed to
//! construct it. It round-trips through TOML so the CLI can keep several
//! named configurations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Which backend to build and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process ONNX causal language model
    Local {
        /// Directory holding `model.onnx` and `tokenizer.json`
        model_dir: PathBuf,

        /// End-of-sequence token; well-known EOS tokens are tried when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eos_token: Option<String>,

        /// Tokens of context fed to the model per step
        #[serde(default = "default_max_context_tokens")]
        max_context_tokens: usize,
    },

    /// Ollama server
    Ollama {
        /// Base URL of the Ollama API
        #[serde(default = "default_endpoint")]
        endpoint: String,

        /// Model tag (e.g. "llama2", "mistral")
        #[serde(default = "default_model")]
        model: String,

        /// Timeout for a single generation request (seconds)
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Generic JSON-over-HTTP endpoint
    Http {
        /// Endpoint receiving the POSTed payload
        api_url: String,

        /// Extra request headers
        #[serde(default)]
        headers: BTreeMap<String, String>,

        /// Base payload; `prompt`, `temperature` and `max_tokens` are set per call
        #[serde(default)]
        payload_template: Map<String, Value>,

        /// Timeout for a single generation request (seconds)
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl BackendConfig {
    /// Ollama on localhost with the given model
    pub fn ollama(model: impl Into<String>) -> Self {
        BackendConfig::Ollama {
            endpoint: default_endpoint(),
            model: model.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Generic HTTP endpoint with an empty payload template
    pub fn http(api_url: impl Into<String>) -> Self {
        BackendConfig::Http {
            api_url: api_url.into(),
            headers: BTreeMap::new(),
            payload_template: Map::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Local model loaded from `model_dir`
    pub fn local(model_dir: impl Into<PathBuf>) -> Self {
        BackendConfig::Local {
            model_dir: model_dir.into(),
            eos_token: None,
            max_context_tokens: default_max_context_tokens(),
        }
    }

    /// Short name of the variant ("local", "ollama", "http")
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Local { .. } => "local",
            BackendConfig::Ollama { .. } => "ollama",
            BackendConfig::Http { .. } => "http",
        }
    }

    /// One-line description for listings
    pub fn summary(&self) -> String {
        match self {
            BackendConfig::Local { model_dir, .. } => format!("local model at {}", model_dir.display()),
            BackendConfig::Ollama { endpoint, model, .. } => format!("ollama {} @ {}", model, endpoint),
            BackendConfig::Http { api_url, .. } => format!("http {}", api_url),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BackendConfig::Local {
                model_dir,
                max_context_tokens,
                ..
            } => {
                if model_dir.as_os_str().is_empty() {
                    return Err("model_dir must not be empty".to_string());
                }
                if *max_context_tokens == 0 {
                    return Err("max_context_tokens must be greater than 0".to_string());
                }
            }
            BackendConfig::Ollama {
                endpoint,
                model,
                timeout_secs,
            } => {
                validate_url("endpoint", endpoint)?;
                if model.trim().is_empty() {
                    return Err("model must not be empty".to_string());
                }
                if *timeout_secs == 0 {
                    return Err("timeout_secs must be greater than 0".to_string());
                }
            }
            BackendConfig::Http {
                api_url,
                timeout_secs,
                ..
            } => {
                validate_url("api_url", api_url)?;
                if *timeout_secs == 0 {
                    return Err("timeout_secs must be greater than 0".to_string());
                }
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::ollama(default_model())
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("{} must start with http:// or https:// (got '{}')", field, url));
    }
    Ok(())
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_context_tokens() -> usize {
    2048
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local_ollama() {
        let config = BackendConfig::default();
        assert_eq!(config.kind(), "ollama");
        assert!(config.validate().is_ok());
        assert!(config.summary().contains("http://localhost:11434"));
    }

    #[test]
    fn test_http_requires_scheme() {
        let config = BackendConfig::http("localhost:8000/generate");
        assert!(config.validate().is_err());

        let config = BackendConfig::http("http://localhost:8000/generate");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = BackendConfig::Ollama {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            timeout_secs: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ollama_from_toml_fills_defaults() {
        let config = BackendConfig::from_toml("kind = \"ollama\"\nmodel = \"mistral\"\n").unwrap();
        assert_eq!(
            config,
            BackendConfig::Ollama {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                model: "mistral".to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            }
        );
    }

    #[test]
    fn test_http_from_toml_with_template() {
        let toml_str = r####"
kind = "http"
api_url = "https://llm.example.com/v1/complete"

[headers]
Authorization = "Bearer secret"

[payload_template]
model = "tiny"
stop = ["###"]
"####;
        let config = BackendConfig::from_toml(toml_str).unwrap();
        match config {
            BackendConfig::Http {
                headers,
                payload_template,
                ..
            } => {
                assert_eq!(headers["Authorization"], "Bearer secret");
                assert_eq!(payload_template["model"], "tiny");
                assert_eq!(payload_template["stop"][0], "###");
            }
            other => panic!("Expected Http config, got {:?}", other),
        }
    }

    #[test]
    fn test_local_from_toml() {
        let config = BackendConfig::from_toml("kind = \"local\"\nmodel_dir = \"/models/tiny\"\n").unwrap();
        assert_eq!(config.kind(), "local");
        assert!(config.validate().is_ok());
    }
}
