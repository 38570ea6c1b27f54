//! Lenient field decoding for station form submissions.
//!
//! Station forms post every input as text, so numbers may arrive as `"50"`
//! and untouched optional inputs arrive as `""`. Other clients send the
//! reverse: bare numbers for text fields such as a chalan number, and full
//! ISO timestamps from date pickers. These helpers are wired in with
//! `#[serde(deserialize_with = ...)]` on the section detail structs.

use chrono::DateTime;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode an optional field; `null` and blank strings mean absent.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        value => coerce(value).map(Some).map_err(D::Error::custom),
    }
}

/// Decode a required field; `null` and blank strings are rejected.
pub(crate) fn required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Err(D::Error::custom("a value is required")),
        Value::String(text) if text.trim().is_empty() => {
            Err(D::Error::custom("a value is required"))
        }
        value => coerce(value).map_err(D::Error::custom),
    }
}

/// Decode `value` as `T`.
///
/// On failure a string is retried as a number and then as an RFC 3339
/// timestamp reduced to its calendar date; a number is retried as its text.
/// The first error is reported if no reading fits.
fn coerce<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    match value {
        Value::String(text) => serde_json::from_value(Value::String(text.clone())).or_else(|err| {
            numeric(&text)
                .and_then(|number| serde_json::from_value(number).ok())
                .or_else(|| {
                    calendar_date(&text).and_then(|date| serde_json::from_value(date).ok())
                })
                .ok_or(err)
        }),
        Value::Number(number) => serde_json::from_value(Value::Number(number.clone()))
            .or_else(|err| serde_json::from_value(Value::String(number.to_string())).map_err(|_| err)),
        other => serde_json::from_value(other),
    }
}

fn calendar_date(text: &str) -> Option<Value> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|timestamp| Value::String(timestamp.date_naive().to_string()))
}

fn numeric(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u64>() {
        return Some(Value::from(n));
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
