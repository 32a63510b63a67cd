//! Wire codec for review decision events.
//!
//! The review events topic is a shared channel: anything that lands on it is
//! untrusted bytes until the envelope's declared `event_type` and
//! `schema_version` have been checked. `decode_review_decision` performs
//! those checks before handing the payload to the caller, so consumers never
//! act on a foreign or incompatible message.

use serde::Deserialize;

use crate::{
    is_compatible, EventEnvelope, ReviewDecisionEvent, REVIEW_DECISION_EVENT_TYPE, SCHEMA_VERSION,
};

/// Decode failure modes. `UnknownSchema` is a well-formed envelope of the
/// wrong type or version; `Malformed` is bytes that do not parse at all.
/// Both are non-retryable and should be routed to the dead-letter topic.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected event schema: type={event_type}, version={schema_version}")]
    UnknownSchema {
        event_type: String,
        schema_version: u32,
    },

    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Minimal view of an envelope, used to inspect the declared schema before
/// committing to a full payload parse.
#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    schema_version: u32,
}

/// Serialize a review decision envelope to its wire form.
pub fn encode_review_decision(
    envelope: &EventEnvelope<ReviewDecisionEvent>,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(envelope)
}

/// Parse a review decision envelope from wire bytes.
///
/// Checks the declared `event_type` and `schema_version` first so a shared
/// channel carrying unrelated message types is rejected with
/// [`DecodeError::UnknownSchema`] rather than a misleading parse error.
pub fn decode_review_decision(
    bytes: &[u8],
) -> Result<EventEnvelope<ReviewDecisionEvent>, DecodeError> {
    let header: EnvelopeHeader = serde_json::from_slice(bytes)?;

    if header.event_type != REVIEW_DECISION_EVENT_TYPE
        || !is_compatible(SCHEMA_VERSION, header.schema_version)
    {
        return Err(DecodeError::UnknownSchema {
            event_type: header.event_type,
            schema_version: header.schema_version,
        });
    }

    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReviewStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_event(comment: Option<&str>) -> EventEnvelope<ReviewDecisionEvent> {
        EventEnvelope::review_decision(
            "review-service",
            ReviewDecisionEvent {
                post_id: Uuid::new_v4(),
                status: ReviewStatus::Rejected,
                reviewer_comment: comment.map(str::to_string),
                decided_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_round_trip() {
        let envelope = sample_event(Some("needs sources for the second claim"));
        let bytes = encode_review_decision(&envelope).unwrap();
        let decoded = decode_review_decision(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_round_trip_without_comment() {
        let envelope = sample_event(None);
        let bytes = encode_review_decision(&envelope).unwrap();
        let decoded = decode_review_decision(&bytes).unwrap();
        assert_eq!(decoded, envelope);
        assert!(decoded.data.reviewer_comment.is_none());
    }

    #[test]
    fn test_rejects_foreign_event_type() {
        let mut value = serde_json::to_value(sample_event(None)).unwrap();
        value["event_type"] = serde_json::json!("comment.created");
        let bytes = serde_json::to_vec(&value).unwrap();

        match decode_review_decision(&bytes) {
            Err(DecodeError::UnknownSchema { event_type, .. }) => {
                assert_eq!(event_type, "comment.created");
            }
            other => panic!("expected UnknownSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_incompatible_version() {
        let mut value = serde_json::to_value(sample_event(None)).unwrap();
        value["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        let bytes = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            decode_review_decision(&bytes),
            Err(DecodeError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn test_rejects_junk_bytes() {
        assert!(matches!(
            decode_review_decision(b"not json at all"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_status_outside_closed_set() {
        let mut value = serde_json::to_value(sample_event(None)).unwrap();
        value["data"]["status"] = serde_json::json!("archived");
        let bytes = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            decode_review_decision(&bytes),
            Err(DecodeError::Malformed(_))
        ));
    }
}
