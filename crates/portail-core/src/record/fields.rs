//! Field extraction shared by the record codecs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::{DEFAULT_BODY, RawEntry, RecordKind};
use crate::error::DecodeError;

pub(crate) const TITLE: &str = "title";
pub(crate) const BODY: &str = "body";
pub(crate) const START_DATE: &str = "startDate";
pub(crate) const END_DATE: &str = "endDate";

/// A required, non-blank title.
pub(crate) fn title(kind: RecordKind, raw: &RawEntry) -> Result<String, DecodeError> {
    let title = required_str(kind, raw, TITLE)?;
    if title.trim().is_empty() {
        return Err(DecodeError::new(kind, "field 'title' must not be empty", raw));
    }
    Ok(title.to_string())
}

/// An optional body; absent or null falls back to [`DEFAULT_BODY`].
pub(crate) fn body(kind: RecordKind, raw: &RawEntry) -> Result<String, DecodeError> {
    match raw.get(BODY) {
        None | Some(Value::Null) => Ok(DEFAULT_BODY.to_string()),
        Some(Value::String(body)) => Ok(body.clone()),
        Some(_) => Err(DecodeError::new(kind, "field 'body' must be a string", raw)),
    }
}

/// A required RFC 3339 timestamp.
pub(crate) fn timestamp(
    kind: RecordKind,
    raw: &RawEntry,
    field: &str,
) -> Result<DateTime<Utc>, DecodeError> {
    let text = required_str(kind, raw, field)?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DecodeError::new(
                kind,
                format!("field '{}' is not an RFC 3339 timestamp: {}", field, e),
                raw,
            )
        })
}

/// Parse a raw value as a timestamp, for query evaluation.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn required_str<'a>(
    kind: RecordKind,
    raw: &'a RawEntry,
    field: &str,
) -> Result<&'a str, DecodeError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(DecodeError::new(
            kind,
            format!("missing required field '{}'", field),
            raw,
        )),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DecodeError::new(
            kind,
            format!("field '{}' must be a string", field),
            raw,
        )),
    }
}
