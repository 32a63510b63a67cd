use chrono::{DateTime, Utc};
/// Event Schema Registry for the Kafka topics shared across newsroom services
///
/// This library defines versioned event schemas so the publishing and the
/// consuming side of a topic cannot silently drift apart. Each envelope
/// carries a required `schema_version` and `event_type` field which the
/// codec checks before the payload is touched.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Wire codec for review decision events
pub mod codec;

pub use codec::{decode_review_decision, encode_review_decision, DecodeError};

/// Current schema version for all events
pub const SCHEMA_VERSION: u32 = 1;

/// Event type carried by review decision envelopes
pub const REVIEW_DECISION_EVENT_TYPE: &str = "review.decision.recorded";

/// Review outcome for a post. The closed set is owned here so the review
/// side (producer) and the post side (consumer) agree on the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Draft,
    Published,
    Pending,
    Rejected,
    Approved,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::Published => "published",
            ReviewStatus::Pending => "pending",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ReviewStatus::Draft),
            "published" => Ok(ReviewStatus::Published),
            "pending" => Ok(ReviewStatus::Pending),
            "rejected" => Ok(ReviewStatus::Rejected),
            "approved" => Ok(ReviewStatus::Approved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error returned when parsing a status string outside the closed set
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown review status: {0}")]
pub struct UnknownStatus(pub String);

/// A reviewer decision about a post, emitted once per review create/update.
///
/// The event is a fact about a point-in-time decision: it has no identity of
/// its own and is never mutated. Consumers must tolerate redelivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecisionEvent {
    /// The post the decision applies to
    pub post_id: Uuid,
    /// Review outcome to propagate onto the post
    pub status: ReviewStatus,
    /// Optional free-text reviewer comment
    pub reviewer_comment: Option<String>,
    /// When the decision was recorded; the consumer-side staleness watermark
    pub decided_at: DateTime<Utc>,
}

/// Base event envelope for all Kafka messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event ID for idempotency and tracing
    pub event_id: Uuid,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Declared event type, checked by the codec on the consuming side
    pub event_type: String,
    /// Source service that generated the event
    pub source: String,
    /// Actual event payload
    pub data: T,
}

impl EventEnvelope<ReviewDecisionEvent> {
    /// Wrap a review decision in a fresh envelope.
    pub fn review_decision(source: impl Into<String>, data: ReviewDecisionEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            event_type: REVIEW_DECISION_EVENT_TYPE.to_string(),
            source: source.into(),
            data,
        }
    }
}

/// Version compatibility check. Exact match for now; backward-compatible
/// ranges can be introduced once a second version exists.
pub fn is_compatible(current_version: u32, message_version: u32) -> bool {
    current_version == message_version
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_creation() {
        let event = ReviewDecisionEvent {
            post_id: Uuid::new_v4(),
            status: ReviewStatus::Approved,
            reviewer_comment: Some("looks good".to_string()),
            decided_at: Utc::now(),
        };

        let envelope = EventEnvelope::review_decision("review-service", event);
        assert_eq!(envelope.schema_version, SCHEMA_VERSION);
        assert_eq!(envelope.event_type, REVIEW_DECISION_EVENT_TYPE);
        assert_eq!(envelope.source, "review-service");
    }

    #[test]
    fn test_version_compatibility() {
        assert!(is_compatible(SCHEMA_VERSION, SCHEMA_VERSION));
        assert!(!is_compatible(1, 2));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ReviewStatus::Draft,
            ReviewStatus::Published,
            ReviewStatus::Pending,
            ReviewStatus::Rejected,
            ReviewStatus::Approved,
        ] {
            assert_eq!(status.as_str().parse::<ReviewStatus>().unwrap(), status);
        }

        assert!("archived".parse::<ReviewStatus>().is_err());
    }
}
