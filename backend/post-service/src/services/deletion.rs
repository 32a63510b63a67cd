/// Cascading delete coordinator.
///
/// Deleting a post is the one operation in this service that spans two
/// stores: the reviews that reference the post live in review-service and
/// must be purged before the local row may go away. The remote purge is
/// issued first; if it cannot be confirmed, the local post is left
/// untouched so the caller can retry the whole operation.
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clients::{RemoteError, ReviewPurgeClient};
use crate::db::PostRepository;

/// In-memory record of an in-flight deletion. Never persisted, never
/// exposed outside the coordinator; it exists so every log line about a
/// deletion carries when the operation started.
#[derive(Debug, Clone, Copy)]
struct DeletionIntent {
    post_id: Uuid,
    initiated_at: DateTime<Utc>,
}

impl DeletionIntent {
    fn new(post_id: Uuid) -> Self {
        Self {
            post_id,
            initiated_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    /// The post does not exist locally; no remote call was made.
    #[error("post not found")]
    NotFound,

    /// The review purge could not be confirmed; the local post survives and
    /// the whole operation may be retried.
    #[error("review purge failed: {0}")]
    DependencyFailed(#[from] RemoteError),

    /// Local storage failed. When this happens after a successful purge the
    /// post survives with its reviews already gone; see `delete_post`.
    #[error("storage failure during deletion: {0}")]
    Storage(String),
}

pub struct DeletionCoordinator {
    repo: Arc<dyn PostRepository>,
    reviews: Arc<dyn ReviewPurgeClient>,
}

impl DeletionCoordinator {
    pub fn new(repo: Arc<dyn PostRepository>, reviews: Arc<dyn ReviewPurgeClient>) -> Self {
        Self { repo, reviews }
    }

    /// Delete `post_id`, purging its reviews in review-service first.
    ///
    /// Before the purge is issued the operation can be abandoned freely.
    /// From that point on it runs on a detached task to completion even if
    /// the caller's request is cancelled: the remote side cannot be
    /// un-asked, so the local step must get its chance to finish.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), DeletionError> {
        if !self
            .repo
            .exists(post_id)
            .await
            .map_err(|e| DeletionError::Storage(e.to_string()))?
        {
            return Err(DeletionError::NotFound);
        }

        let intent = DeletionIntent::new(post_id);
        let repo = Arc::clone(&self.repo);
        let reviews = Arc::clone(&self.reviews);

        let outcome = tokio::spawn(async move {
            reviews.purge_reviews_for_post(intent.post_id).await?;

            match repo.delete(intent.post_id).await {
                Ok(true) => {
                    info!(
                        post_id = %intent.post_id,
                        initiated_at = %intent.initiated_at,
                        "post and dependent reviews deleted"
                    );
                    Ok(())
                }
                Ok(false) => {
                    // Lost a race with another deletion of the same post;
                    // the end state is the requested one.
                    warn!(post_id = %intent.post_id, "post already gone after purge");
                    Ok(())
                }
                Err(e) => {
                    // Known inconsistency window: the purge succeeded but
                    // the local row survived. There is no automatic rollback
                    // of the purge (it is not guaranteed reversible), so the
                    // condition is surfaced loudly instead of hidden.
                    error!(
                        post_id = %intent.post_id,
                        initiated_at = %intent.initiated_at,
                        error = %e,
                        "reviews purged but local post delete failed; post survives without reviews"
                    );
                    Err(DeletionError::Storage(e.to_string()))
                }
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(join_err) => Err(DeletionError::Storage(join_err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockReviewPurgeClient;
    use crate::db::{MockPostRepository, RepoError};

    fn coordinator(
        repo: MockPostRepository,
        reviews: MockReviewPurgeClient,
    ) -> DeletionCoordinator {
        DeletionCoordinator::new(Arc::new(repo), Arc::new(reviews))
    }

    #[tokio::test]
    async fn test_delete_success() {
        let post_id = Uuid::new_v4();

        let mut repo = MockPostRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        repo.expect_delete().times(1).returning(|_| Ok(true));

        let mut reviews = MockReviewPurgeClient::new();
        reviews
            .expect_purge_reviews_for_post()
            .times(1)
            .returning(|_| Ok(()));

        let result = coordinator(repo, reviews).delete_post(post_id).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_aborts_when_purge_fails() {
        let post_id = Uuid::new_v4();

        let mut repo = MockPostRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        // The local row must never be touched when the purge fails.
        repo.expect_delete().times(0);

        let mut reviews = MockReviewPurgeClient::new();
        reviews
            .expect_purge_reviews_for_post()
            .times(1)
            .returning(|_| Err(RemoteError::Timeout));

        let result = coordinator(repo, reviews).delete_post(post_id).await;
        assert!(matches!(
            result,
            Err(DeletionError::DependencyFailed(RemoteError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_post_makes_no_remote_call() {
        let post_id = Uuid::new_v4();

        let mut repo = MockPostRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(false));
        repo.expect_delete().times(0);

        let mut reviews = MockReviewPurgeClient::new();
        reviews.expect_purge_reviews_for_post().times(0);

        let result = coordinator(repo, reviews).delete_post(post_id).await;
        assert!(matches!(result, Err(DeletionError::NotFound)));
    }

    #[tokio::test]
    async fn test_local_delete_failure_after_purge_is_surfaced() {
        let post_id = Uuid::new_v4();

        let mut repo = MockPostRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        repo.expect_delete()
            .times(1)
            .returning(|_| Err(RepoError("connection reset".to_string())));

        let mut reviews = MockReviewPurgeClient::new();
        reviews
            .expect_purge_reviews_for_post()
            .times(1)
            .returning(|_| Ok(()));

        let result = coordinator(repo, reviews).delete_post(post_id).await;
        assert!(matches!(result, Err(DeletionError::Storage(_))));
    }

    #[tokio::test]
    async fn test_concurrent_loser_is_still_success() {
        let post_id = Uuid::new_v4();

        let mut repo = MockPostRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        // Row vanished between purge and delete: another delete won.
        repo.expect_delete().times(1).returning(|_| Ok(false));

        let mut reviews = MockReviewPurgeClient::new();
        reviews
            .expect_purge_reviews_for_post()
            .times(1)
            .returning(|_| Ok(()));

        let result = coordinator(repo, reviews).delete_post(post_id).await;
        assert!(result.is_ok());
    }
}
