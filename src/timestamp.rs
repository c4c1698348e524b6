//! Calendar timestamps (`chrono::DateTime<Utc>`) inside records.

use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::options::{Options, TimeRepr};

/// Interpret `value` as a timestamp.
///
/// Strings are tried against the configured layout, then RFC 3339, then as
/// integer Unix seconds. Numbers are Unix seconds. Anything that fails to
/// parse is the Unix epoch.
pub(crate) fn decode(value: &Value, options: &Options) -> DateTime<Utc> {
    let parsed = match value {
        Value::String(s) => parse_str(s.trim(), &options.time_format),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    };
    parsed.unwrap_or_default()
}

fn parse_str(s: &str, layout: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(s, layout) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Render a timestamp the way `options` asks for.
pub(crate) fn encode(timestamp: &DateTime<Utc>, options: &Options) -> Value {
    match options.time_repr {
        TimeRepr::String => {
            let mut out = String::new();
            if write!(out, "{}", timestamp.format(&options.time_format)).is_err() {
                log::debug!("Invalid time layout {:?}, using RFC 3339", options.time_format);
                out = timestamp.to_rfc3339();
            }
            Value::String(out)
        }
        TimeRepr::Numeric => Value::from(timestamp.timestamp()),
    }
}

/// Whether `timestamp` is the zero value.
pub(crate) fn is_epoch(timestamp: &DateTime<Utc>) -> bool {
    *timestamp == DateTime::<Utc>::default()
}
