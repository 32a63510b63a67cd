/// Data models for post-service
use chrono::{DateTime, Utc};
use event_schema::ReviewStatus;
use serde::Serialize;
use uuid::Uuid;

/// A post in the newsroom. `status` is owned by the review pipeline: it must
/// always reflect the most recently decided review that has been applied,
/// with `last_decision_at` acting as the staleness watermark for redelivered
/// events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub status: ReviewStatus,
    /// Watermark: `decided_at` of the newest applied review decision
    pub last_decision_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a post. New posts start in `draft` until a reviewer
/// decision arrives.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
}

/// Editable fields of a post. Status is deliberately absent: it only moves
/// through the review pipeline.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
}

/// Search filter for posts: substring match on content, exact match on
/// category and author. Empty filter returns everything.
#[derive(Debug, Clone, Default)]
pub struct PostSearch {
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
}
