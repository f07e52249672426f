//! Post-processing of model output: JSON extraction, sanitization and cost estimates

pub mod cost;
pub mod json;
pub mod sanitize;

pub use cost::{estimate_cost, format_cost, ModelPrice, PriceTable};
pub use json::{extract_field, extract_json, extract_object, extract_typed, extract_validated, extract_with_schema};
pub use sanitize::{clamp_float, coerce_float, coerce_int, sanitize, SanitizeRules};
