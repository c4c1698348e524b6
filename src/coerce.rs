//! Total conversions from a generic [`Value`] into primitive kinds.
//!
//! None of these functions fail: input that cannot be interpreted as the
//! requested kind degrades to that kind's zero value. A single malformed
//! scalar deep inside a document therefore never aborts a conversion.

use serde_json::Value;

/// Render a value as a string.
///
/// `null` becomes the empty string, strings are returned as-is, floats
/// without a fractional part render as integers (`100.0` as `"100"`), and
/// every other value uses its compact JSON rendering.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && is_whole(f) => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Whole floats small enough to print without an exponent.
fn is_whole(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21
}

/// Coerce a value into a signed 64-bit integer.
///
/// Numeric strings are parsed in base 10, floats are truncated toward zero
/// (saturating at the type bounds) and unsigned values above `i64::MAX` wrap.
/// Booleans, collections and unparseable strings yield `0`.
pub fn to_i64(value: &Value) -> i64 {
    match value {
        Value::String(s) => s.parse::<i64>().unwrap_or(0),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(u) = n.as_u64() {
                u as i64
            } else {
                n.as_f64().map(|f| f as i64).unwrap_or(0)
            }
        }
        _ => 0,
    }
}

/// Coerce a value into an unsigned 64-bit integer.
///
/// Negative integers wrap, negative floats saturate at `0`.
pub fn to_u64(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.parse::<u64>().unwrap_or(0),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(i) = n.as_i64() {
                i as u64
            } else {
                n.as_f64().map(|f| f as u64).unwrap_or(0)
            }
        }
        _ => 0,
    }
}

/// Coerce a value into a 64-bit float.
pub fn to_f64(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Coerce a value into a boolean.
///
/// Strings accept `1`, `t`, `T`, `TRUE`, `true`, `True` and their `false`
/// counterparts; numbers are `true` when strictly greater than zero.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => parse_bool(s).unwrap_or(false),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i > 0
            } else if let Some(u) = n.as_u64() {
                u > 0
            } else {
                n.as_f64().is_some_and(|f| f > 0.0)
            }
        }
        _ => false,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Whether a value is the zero value of its own kind.
///
/// Used for omit-empty decisions once a field has been normalized.
pub(crate) fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
