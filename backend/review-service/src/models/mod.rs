/// Data models for review-service
use chrono::{DateTime, Utc};
use event_schema::ReviewStatus;
use serde::Serialize;
use uuid::Uuid;

/// A reviewer decision about a post. `reviewed_at` is set server-side on
/// every insert and update; it becomes the `decided_at` watermark of the
/// published decision event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub post_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: ReviewStatus,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Fields for recording a new review decision.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub post_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: ReviewStatus,
    pub comment: Option<String>,
}

/// Fields for re-deciding an existing review.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub post_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: ReviewStatus,
    pub comment: Option<String>,
}
