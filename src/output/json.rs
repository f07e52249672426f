//! JSON extraction from LLM response text
//!
//! Models often wrap JSON in prose or markdown fences. These helpers pull the
//! payload out, parse it, and optionally validate it against a Rust type or a
//! JSON Schema document.

use crate::error::{LlmError, LlmResult};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// First fenced block, optional `json` tag, possibly empty, non-greedy
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```").expect("fenced block pattern is valid")
});

/// Text that will actually be parsed: the first fenced block's interior, or the whole text
pub fn payload_text(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// Extract JSON from LLM response text
///
/// Handles raw JSON, JSON in ```` ```json ```` fences and JSON in plain
/// ```` ``` ```` fences. Only the first fenced block is considered.
pub fn extract_json(text: &str) -> LlmResult<Value> {
    let payload = payload_text(text);
    serde_json::from_str(payload)
        .map_err(|e| LlmError::json_extraction_failed(e.to_string(), payload))
}

/// Extract a JSON object, failing on arrays and scalars
pub fn extract_object(text: &str) -> LlmResult<Map<String, Value>> {
    match extract_json(text)? {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::UnexpectedJsonShape {
            found: json_type_name(&other),
        }),
    }
}

/// Extract a JSON object and deserialize it into `T`
///
/// Deserialization errors are surfaced unchanged as [`LlmError::Validation`].
pub fn extract_validated<T: DeserializeOwned>(text: &str) -> LlmResult<T> {
    let object = extract_object(text)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Extract a JSON object and validate it against a JSON Schema document
pub fn extract_with_schema(text: &str, schema: &Value) -> LlmResult<Map<String, Value>> {
    let object = extract_object(text)?;
    let instance = Value::Object(object.clone());

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| LlmError::SchemaViolation(format!("Schema compilation error: {e}")))?;

    validator.validate(&instance).map_err(|errors| {
        let error_messages: Vec<String> = errors
            .map(|e| format!("At '{}': {}", e.instance_path, e))
            .collect();
        LlmError::SchemaViolation(error_messages.join("; "))
    })?;

    Ok(object)
}

/// Extract, check against the schema derived from `T`, then deserialize
pub fn extract_typed<T: DeserializeOwned + JsonSchema>(text: &str) -> LlmResult<T> {
    let schema = serde_json::to_value(schemars::schema_for!(T))?;
    let object = extract_with_schema(text, &schema)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Best-effort lookup of one top-level field
///
/// Any failure (unparseable text, non-object JSON, missing field) yields `default`.
pub fn extract_field(text: &str, field: &str, default: Value) -> Value {
    match extract_json(text) {
        Ok(Value::Object(mut map)) => map.remove(field).unwrap_or(default),
        _ => default,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
