//! Generic HTTP backend
//!
//! POSTs a JSON payload built from a template to an arbitrary endpoint and
//! pulls the completion out of the first well-known field in the reply.

use crate::BackendError;
use cardsmith_domain::{GenerationOptions, ModelBackend};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Reply fields checked for the completion, in order
pub const COMPLETION_FIELDS: [&str; 4] = ["response", "text", "generated_text", "output"];

/// Timeout for the reachability probe
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Backend for any JSON-over-HTTP completion endpoint
pub struct HttpBackend {
    api_url: String,
    payload_template: Map<String, Value>,
    client: Client,
}

impl HttpBackend {
    /// Build the backend and check that the endpoint is reachable
    ///
    /// Any HTTP answer to the probe counts as reachable, since many
    /// completion endpoints reject `GET`. Only a transport failure is fatal.
    pub fn connect(
        api_url: impl Into<String>,
        headers: &BTreeMap<String, String>,
        payload_template: Map<String, Value>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let api_url = api_url.into();

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(header_map(headers)?)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        client
            .get(&api_url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .map_err(|e| BackendError::from_transport("Endpoint unreachable", e))?;

        info!(api_url = %api_url, "Connected to HTTP backend");
        Ok(Self {
            api_url,
            payload_template,
            client,
        })
    }

    /// Payload sent for `prompt`: the template with per-call fields overlaid
    pub fn build_payload(&self, prompt: &str, options: &GenerationOptions) -> Value {
        let mut payload = self.payload_template.clone();
        payload.insert("prompt".to_string(), Value::from(prompt));
        payload.insert("temperature".to_string(), Value::from(options.temperature));
        payload.insert("max_tokens".to_string(), Value::from(options.max_tokens));
        Value::Object(payload)
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, BackendError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BackendError::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| BackendError::Config(format!("Invalid value for header '{}': {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Pull the completion text out of a reply body
///
/// String fields are returned verbatim, other JSON values are serialized.
/// When none of the known fields is present the whole body is serialized.
pub fn completion_from_body(body: &Value) -> String {
    COMPLETION_FIELDS
        .iter()
        .find_map(|field| body.get(field))
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.to_string())
}

impl ModelBackend for HttpBackend {
    type Error = BackendError;

    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        let payload = self.build_payload(prompt, options);
        debug!(api_url = %self.api_url, "Sending completion request");

        let response = self
            .client
            .post(&self.api_url)
            .json(&payload)
            .send()
            .map_err(|e| BackendError::from_transport("Request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| BackendError::from_transport("Failed to read response body", e))?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("Response is not JSON: {}", e)))?;

        Ok(completion_from_body(&body))
    }

    fn describe(&self) -> String {
        format!("http:{}", self.api_url)
    }
}
