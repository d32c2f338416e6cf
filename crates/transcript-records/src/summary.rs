//! Summary update rows.

use crate::error::{require, RecordResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Input fields for a summary update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFields {
    pub session_id: Option<String>,
    pub text: Option<String>,
    /// Epoch milliseconds.
    #[serde(alias = "updatedAt")]
    pub timestamp: Option<i64>,
}

/// Column values for updating a session's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryUpdate {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

pub fn create_summary_update_fields(fields: SummaryFields) -> RecordResult<SummaryUpdate> {
    create_summary_update_fields_at(fields, Utc::now().timestamp_millis())
}

/// Same as [`create_summary_update_fields`] with an explicit "now" in epoch
/// milliseconds.
pub fn create_summary_update_fields_at(
    fields: SummaryFields,
    now_ms: i64,
) -> RecordResult<SummaryUpdate> {
    let session_id = require(
        fields.session_id.as_deref(),
        "sessionId",
        "update a summary record",
    )?
    .to_string();

    Ok(SummaryUpdate {
        session_id,
        text: fields.text,
        updated_at: fields.timestamp.unwrap_or(now_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordError;
    use serde_json::json;

    #[test]
    fn session_id_is_required() {
        let err = create_summary_update_fields(SummaryFields::default()).unwrap_err();
        assert_eq!(
            err,
            RecordError::Validation("sessionId is required to update a summary record".to_string())
        );

        let err = create_summary_update_fields(SummaryFields {
            session_id: Some(String::new()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn defaults_updated_at_to_now() {
        let update = create_summary_update_fields_at(
            SummaryFields {
                session_id: Some("s".to_string()),
                text: Some("Week 3 recap".to_string()),
                timestamp: None,
            },
            1_700_000_000_000,
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"session_id": "s", "text": "Week 3 recap", "updated_at": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn keeps_explicit_timestamp() {
        let fields: SummaryFields =
            serde_json::from_value(json!({"sessionId": "s", "timestamp": 42})).unwrap();
        let update = create_summary_update_fields_at(fields, 1_000).unwrap();
        assert_eq!(update.updated_at, 42);
        assert!(update.text.is_none());

        let fields: SummaryFields =
            serde_json::from_value(json!({"sessionId": "s", "updatedAt": 7})).unwrap();
        assert_eq!(create_summary_update_fields_at(fields, 1_000).unwrap().updated_at, 7);
    }

    #[test]
    fn live_clock_is_used_by_default() {
        let before = Utc::now().timestamp_millis();
        let update = create_summary_update_fields(SummaryFields {
            session_id: Some("s".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(update.updated_at >= before);
    }
}
