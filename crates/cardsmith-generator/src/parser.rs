//! Parse model output into question/answer pairs
//!
//! Models wrap their JSON in prose or markdown fences often enough that the
//! parser does not try to understand the wrapping: it takes everything from
//! the first `[` to the last `]` and decodes that.

use crate::error::GeneratorError;
use cardsmith_domain::CardPair;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse a raw model response into card pairs
///
/// Elements that are not objects, or whose question or answer is empty after
/// trimming, are dropped. An array with no usable element yields an empty
/// vector, not an error.
///
/// # Errors
///
/// Returns `GeneratorError::Parse` if no bracketed span exists, the span is
/// not valid JSON, or it does not decode to an array.
pub fn parse_cards(response: &str) -> Result<Vec<CardPair>, GeneratorError> {
    let json_str = extract_array_span(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| GeneratorError::Parse(format!("JSON parse error: {}", e)))?;

    let items = json
        .as_array()
        .ok_or_else(|| GeneratorError::Parse("Expected JSON array".to_string()))?;

    let mut cards = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            debug!("Dropping element {}: not an object", idx);
            continue;
        };

        let question = field_text(obj, "question");
        let answer = field_text(obj, "answer");
        let (question, answer) = (question.trim(), answer.trim());

        if question.is_empty() || answer.is_empty() {
            debug!("Dropping element {}: empty question or answer", idx);
            continue;
        }
        cards.push(CardPair::new(question, answer));
    }

    Ok(cards)
}

/// Slice from the first `[` to the last `]`, inclusive
fn extract_array_span(response: &str) -> Result<&str, GeneratorError> {
    let start = response.find('[');
    let end = response.rfind(']');

    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(&response[start..=end]),
        _ => Err(GeneratorError::Parse(
            "No JSON array found in response".to_string(),
        )),
    }
}

/// Coerce a field to text: strings as-is, missing or null as empty, anything else as JSON
fn field_text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
