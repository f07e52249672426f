//! Output sanitization for LLM responses
//!
//! Cleans up the usual problems in model-produced objects (nulls, empty
//! strings, scalars where lists belong) so strict deserialization downstream
//! succeeds, and coerces loosely typed numbers.

use serde_json::{Map, Value};

/// Field rules applied by [`sanitize`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizeRules {
    /// Fields that must hold a non-empty value; falsy values get the default or `""`
    pub required_strings: Vec<String>,
    /// Fields that must be arrays; anything else becomes `[]`
    pub required_lists: Vec<String>,
    /// Values for fields that are absent or null
    pub defaults: Map<String, Value>,
}

impl SanitizeRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required_string<S: Into<String>>(mut self, field: S) -> Self {
        self.required_strings.push(field.into());
        self
    }

    pub fn required_list<S: Into<String>>(mut self, field: S) -> Self {
        self.required_lists.push(field.into());
        self
    }

    pub fn default_value<S: Into<String>>(mut self, field: S, value: Value) -> Self {
        self.defaults.insert(field.into(), value);
        self
    }
}

/// Produce a sanitized copy of `data`; the input is left untouched
///
/// Rules apply in order: defaults for absent/null fields, then required
/// strings, then required lists. Field order is preserved and unrelated
/// fields pass through.
pub fn sanitize(data: &Map<String, Value>, rules: &SanitizeRules) -> Map<String, Value> {
    let mut result = data.clone();

    for (field, default) in &rules.defaults {
        if result.get(field).map_or(true, Value::is_null) {
            result.insert(field.clone(), default.clone());
        }
    }

    for field in &rules.required_strings {
        if result.get(field).map_or(true, is_falsy) {
            let fallback = rules
                .defaults
                .get(field)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            result.insert(field.clone(), fallback);
        }
    }

    for field in &rules.required_lists {
        if !result.get(field).is_some_and(Value::is_array) {
            result.insert(field.clone(), Value::Array(Vec::new()));
        }
    }

    result
}

/// Null, false, zero, and empty strings, arrays and objects
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Coerce a value to `f64`, returning `default` when it cannot be converted
///
/// Numbers convert directly, booleans become 1/0, strings are parsed after
/// trimming whitespace.
pub fn coerce_float(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(default),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(default),
        _ => default,
    }
}

/// Coerce a value to `i64` via float parsing, truncating toward zero
///
/// `"3.9"` becomes 3 and `"-3.9"` becomes -3. Non-finite or out-of-range
/// values return `default`.
pub fn coerce_int(value: &Value, default: i64) -> i64 {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return i;
        }
    }

    let Some(f) = coerce_float_opt(value) else {
        return default;
    };
    let truncated = f.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return default;
    }
    truncated as i64
}

/// Coerce to `f64` and clamp into `[min, max]`
///
/// When `min > max` the result is always `min`.
pub fn clamp_float(value: &Value, min: f64, max: f64, default: f64) -> f64 {
    let f = coerce_float(value, default);
    f.min(max).max(min)
}

fn coerce_float_opt(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
