//! Transcript segment records.

use crate::error::{require, RecordResult};
use crate::timestamp::{format_timestamp, normalize_timestamp, TimestampInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PURPOSE: &str = "create a transcript record";

/// Input fields for one transcript segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptFields {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub group_id: Option<String>,
    pub text: Option<String>,
    pub word_count: Option<u64>,
    pub duration_seconds: Option<f64>,
    pub segment_number: Option<u64>,
    pub created_at: Option<TimestampInput>,
    pub is_noise: Option<bool>,
}

/// Segment row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub word_count: u64,
    pub duration_seconds: f64,
    pub segment_number: u64,
    pub is_noise: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub session_id: String,
    pub group_id: String,
    pub segment: TranscriptSegment,
}

/// Build a transcript record, stamping it with the current time when no
/// `createdAt` is given.
pub fn create_transcript_record(fields: TranscriptFields) -> RecordResult<TranscriptRecord> {
    create_transcript_record_at(fields, Utc::now())
}

/// Same as [`create_transcript_record`] with an explicit "now".
pub fn create_transcript_record_at(
    fields: TranscriptFields,
    now: DateTime<Utc>,
) -> RecordResult<TranscriptRecord> {
    let session_id = require(fields.session_id.as_deref(), "sessionId", PURPOSE)?.to_string();
    let group_id = require(fields.group_id.as_deref(), "groupId", PURPOSE)?.to_string();
    let id = require(fields.id.as_deref(), "id", PURPOSE)?.to_string();

    let created_at = match fields.created_at.as_ref().filter(|input| !input.is_blank()) {
        Some(input) => normalize_timestamp(input)?,
        None => format_timestamp(now),
    };

    debug!(session_id = %session_id, segment_id = %id, "Built transcript record");

    Ok(TranscriptRecord {
        session_id,
        group_id,
        segment: TranscriptSegment {
            id,
            text: fields.text,
            word_count: fields.word_count.unwrap_or(0),
            duration_seconds: fields.duration_seconds.unwrap_or(0.0),
            segment_number: fields.segment_number.unwrap_or(0),
            is_noise: fields.is_noise.unwrap_or(false),
            created_at,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordError;
    use chrono::TimeZone;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> TranscriptFields {
        serde_json::from_value(value).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn empty_fields_are_rejected() {
        let err = create_transcript_record(fields(json!({}))).unwrap_err();
        assert_eq!(
            err,
            RecordError::Validation(
                "sessionId is required to create a transcript record".to_string()
            )
        );
    }

    #[test]
    fn identifiers_are_checked_in_order() {
        let err = create_transcript_record(fields(json!({"sessionId": "s"}))).unwrap_err();
        assert!(err.to_string().contains("groupId"));

        let err = create_transcript_record(fields(json!({"sessionId": "s", "groupId": "g"})))
            .unwrap_err();
        assert!(err.to_string().contains("id is required"));
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let err = create_transcript_record(fields(json!({
            "id": "1", "sessionId": "", "groupId": "g"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("sessionId"));
    }

    #[test]
    fn minimal_record_gets_defaults() {
        let record = create_transcript_record_at(
            fields(json!({"id": "1", "sessionId": "s", "groupId": "g"})),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(record.session_id, "s");
        assert_eq!(record.group_id, "g");
        assert_eq!(record.segment.word_count, 0);
        assert_eq!(record.segment.duration_seconds, 0.0);
        assert_eq!(record.segment.segment_number, 0);
        assert!(!record.segment.is_noise);
        assert_eq!(record.segment.created_at, "2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn full_record_serializes_in_store_shape() {
        let record = create_transcript_record(fields(json!({
            "id": "seg-7",
            "sessionId": "s-1",
            "groupId": "g-2",
            "text": "hello class",
            "wordCount": 2,
            "durationSeconds": 1.5,
            "segmentNumber": 7,
            "createdAt": "2024-03-01T10:15:30+08:00",
            "isNoise": true
        })))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "sessionId": "s-1",
                "groupId": "g-2",
                "segment": {
                    "id": "seg-7",
                    "text": "hello class",
                    "word_count": 2,
                    "duration_seconds": 1.5,
                    "segment_number": 7,
                    "is_noise": true,
                    "created_at": "2024-03-01T02:15:30.000Z"
                }
            })
        );
    }

    #[test]
    fn blank_created_at_uses_now() {
        let record = create_transcript_record_at(
            fields(json!({"id": "1", "sessionId": "s", "groupId": "g", "createdAt": " "})),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(record.segment.created_at, "2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn epoch_millis_created_at() {
        let record = create_transcript_record(fields(json!({
            "id": "1", "sessionId": "s", "groupId": "g", "createdAt": 1_700_000_000_000i64
        })))
        .unwrap();
        assert_eq!(record.segment.created_at, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn unparseable_created_at_is_rejected() {
        let err = create_transcript_record(fields(json!({
            "id": "1", "sessionId": "s", "groupId": "g", "createdAt": "not a date"
        })))
        .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }
}
