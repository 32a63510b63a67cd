/// Database access for post-service
///
/// `PostRepository` is the seam between the HTTP/consumer layers and
/// storage; the sqlx implementation lives in `post_repo`, tests substitute
/// mocks or in-memory implementations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_schema::ReviewStatus;
use uuid::Uuid;

use crate::models::{NewPost, Post, PostSearch, PostUpdate};

pub mod post_repo;

pub use post_repo::SqlxPostRepository;

/// Storage failure. Everything here is considered transient from the
/// consumer's point of view: the delivery layer retries and eventually
/// dead-letters, it never drops an event because the database hiccuped.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage error: {0}")]
pub struct RepoError(pub String);

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError(err.to_string())
    }
}

/// Outcome of a watermark-checked status application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Status and watermark were updated
    Applied,
    /// The event is older than the stored watermark; state untouched
    Stale,
    /// No such post; the event has nothing to apply to
    NotFound,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    async fn search(&self, filter: PostSearch) -> Result<Vec<Post>, RepoError>;

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, RepoError>;

    async fn exists(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Delete the post row. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Apply a review decision to the post, but only if `decided_at` is not
    /// older than the stored watermark. Status, watermark and `updated_at`
    /// move in one atomic mutation so a stale redelivery can never revert a
    /// newer status.
    async fn apply_review_status(
        &self,
        post_id: Uuid,
        status: ReviewStatus,
        decided_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome, RepoError>;
}
