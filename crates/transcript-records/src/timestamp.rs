//! Timestamp normalization for record fields.

use crate::error::{RecordError, RecordResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp as callers provide it: epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampInput {
    Millis(i64),
    Text(String),
}

impl TimestampInput {
    /// Blank strings count as "not provided".
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl From<i64> for TimestampInput {
    fn from(ms: i64) -> Self {
        Self::Millis(ms)
    }
}

impl From<&str> for TimestampInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Canonical form: UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse any accepted timestamp form and render it canonically.
///
/// Strings without an offset are read as UTC.
pub fn normalize_timestamp(input: &TimestampInput) -> RecordResult<String> {
    let parsed = match input {
        TimestampInput::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        TimestampInput::Text(text) => parse_text(text.trim()),
    };
    parsed
        .map(format_timestamp)
        .ok_or_else(|| RecordError::Validation(format!("invalid timestamp: {}", describe(input))))
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn describe(input: &TimestampInput) -> String {
    match input {
        TimestampInput::Millis(ms) => ms.to_string(),
        TimestampInput::Text(text) => format!("{text:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_offsets_and_converts_to_utc() {
        let input = TimestampInput::from("2024-03-01T10:15:30+08:00");
        assert_eq!(normalize_timestamp(&input).unwrap(), "2024-03-01T02:15:30.000Z");
    }

    #[test]
    fn truncates_to_milliseconds() {
        let input = TimestampInput::from("2024-03-01T02:15:30.123456Z");
        assert_eq!(normalize_timestamp(&input).unwrap(), "2024-03-01T02:15:30.123Z");
    }

    #[test]
    fn naive_forms_are_utc() {
        assert_eq!(
            normalize_timestamp(&"2024-03-01T02:15:30".into()).unwrap(),
            "2024-03-01T02:15:30.000Z"
        );
        assert_eq!(
            normalize_timestamp(&"2024-03-01 02:15:30.5".into()).unwrap(),
            "2024-03-01T02:15:30.500Z"
        );
        assert_eq!(
            normalize_timestamp(&"2024-03-01".into()).unwrap(),
            "2024-03-01T00:00:00.000Z"
        );
    }

    #[test]
    fn epoch_millis() {
        assert_eq!(
            normalize_timestamp(&TimestampInput::Millis(1_700_000_000_123)).unwrap(),
            "2023-11-14T22:13:20.123Z"
        );
        assert_eq!(
            normalize_timestamp(&TimestampInput::Millis(0)).unwrap(),
            "1970-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn garbage_is_a_validation_error() {
        let err = normalize_timestamp(&"yesterday-ish".into()).unwrap_err();
        assert_eq!(
            err,
            RecordError::Validation("invalid timestamp: \"yesterday-ish\"".to_string())
        );
        assert!(normalize_timestamp(&TimestampInput::Millis(i64::MAX)).is_err());
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let millis: TimestampInput = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(millis, TimestampInput::Millis(1_700_000_000_000));
        let text: TimestampInput = serde_json::from_str("\"2024-03-01\"").unwrap();
        assert_eq!(text, TimestampInput::Text("2024-03-01".to_string()));
    }
}
