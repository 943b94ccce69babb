//! # Normalizer
//!
//! Recursive canonicalization of keyword values so that two inputs that
//! describe the same configuration modulo formatting end up identical.
//!
//! ## Rules
//!
//! | Input | Result |
//! |-------|--------|
//! | object | every value normalized, keys untouched |
//! | array | every element normalized, order preserved |
//! | string | lowercased when `lowercase` is set |
//! | float | rounded to `digits` significant digits unless exact |
//! | other | unchanged |
//!
//! Key ordering is not the normalizer's concern; the hash step sorts keys.

use serde_json::{Map, Number, Value};

/// Significant digits kept when floats are not exact.
pub const FLOAT_SIGNIFICANT_DIGITS: u32 = 10;

/// Switches controlling [`recursive_normalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Lowercase every string value.
    pub lowercase: bool,
    /// Significant digits for floats, `None` keeps floats exactly.
    pub digits: Option<u32>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            digits: Some(FLOAT_SIGNIFICANT_DIGITS),
        }
    }
}

impl NormalizeOptions {
    /// Options matching a keyword set's `lowercase` / `exact_floats` flags.
    pub fn from_flags(lowercase: bool, exact_floats: bool) -> Self {
        Self {
            lowercase,
            digits: if exact_floats {
                None
            } else {
                Some(FLOAT_SIGNIFICANT_DIGITS)
            },
        }
    }
}

/// Normalize an arbitrary JSON value.
pub fn recursive_normalizer(value: &Value, options: &NormalizeOptions) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_map(map, options)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| recursive_normalizer(item, options))
                .collect(),
        ),
        Value::String(s) if options.lowercase => Value::String(s.to_lowercase()),
        Value::Number(n) if n.is_f64() => match (n.as_f64(), options.digits) {
            (Some(f), Some(digits)) => Number::from_f64(round_significant(f, digits))
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

/// Normalize every value of a mapping.
pub fn normalize_map(map: &Map<String, Value>, options: &NormalizeOptions) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), recursive_normalizer(v, options)))
        .collect()
}

/// Round `value` to `digits` significant decimal digits.
///
/// Goes through the shortest scientific rendering so the result is the
/// nearest double to a `digits`-digit decimal, which makes the operation
/// idempotent. Negative zero collapses to zero.
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return if value == 0.0 { 0.0 } else { value };
    }

    let precision = digits.max(1) as usize - 1;
    let rendered = format!("{:.*e}", precision, value);
    let rounded = rendered.parse::<f64>().unwrap_or(value);

    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
