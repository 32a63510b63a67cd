/// Review service - records reviewer decisions and fans them out.
///
/// The ordering contract with post-service: a decision event is published
/// only after the review row's own write has committed, so the channel
/// never advertises a decision that could still be rolled back. Publishing
/// itself is best-effort from the API caller's point of view; a broker
/// outage must not fail the review request, it only delays status sync.
use chrono::Utc;
use event_schema::{EventEnvelope, ReviewDecisionEvent, ReviewStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::clients::{NotificationClient, NotificationRequest};
use crate::error::{AppError, Result};
use crate::kafka::ReviewEventPublisher;
use crate::metrics;
use crate::models::{NewReview, Review, ReviewUpdate};

const EVENT_SOURCE: &str = "review-service";

pub struct ReviewService {
    pool: PgPool,
    publisher: Arc<dyn ReviewEventPublisher>,
    notifier: Option<NotifierHandle>,
}

struct NotifierHandle {
    client: Arc<NotificationClient>,
    recipient: String,
}

fn review_from_row(row: &PgRow) -> Result<Review> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ReviewStatus>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Review {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        reviewer_id: row.try_get("reviewer_id")?,
        status,
        comment: row.try_get("comment")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

/// Build the decision event for a stored review. `reviewed_at` becomes the
/// consumer-side staleness watermark.
pub fn decision_envelope(review: &Review) -> EventEnvelope<ReviewDecisionEvent> {
    EventEnvelope::review_decision(
        EVENT_SOURCE,
        ReviewDecisionEvent {
            post_id: review.post_id,
            status: review.status,
            reviewer_comment: review.comment.clone(),
            decided_at: review.reviewed_at,
        },
    )
}

/// Publish the decision for a durably-stored review. Returns whether the
/// event reached the channel; a failure is logged and swallowed so the
/// review API response is never blocked by the broker.
pub async fn publish_decision_best_effort(
    publisher: &dyn ReviewEventPublisher,
    review: &Review,
) -> bool {
    let envelope = decision_envelope(review);

    match publisher.publish(&envelope).await {
        Ok(ack) => {
            debug!(
                event_id = %ack.event_id,
                post_id = %review.post_id,
                status = %review.status,
                "review decision event published"
            );
            metrics::REVIEW_DECISIONS_PUBLISHED.inc();
            true
        }
        Err(e) => {
            error!(
                post_id = %review.post_id,
                review_id = %review.id,
                error = %e,
                "review decision event publish failed; post status sync will lag"
            );
            metrics::REVIEW_DECISION_PUBLISH_FAILURES.inc();
            false
        }
    }
}

impl ReviewService {
    pub fn new(pool: PgPool, publisher: Arc<dyn ReviewEventPublisher>) -> Self {
        Self {
            pool,
            publisher,
            notifier: None,
        }
    }

    pub fn with_notifier(
        mut self,
        client: Arc<NotificationClient>,
        recipient: impl Into<String>,
    ) -> Self {
        self.notifier = Some(NotifierHandle {
            client,
            recipient: recipient.into(),
        });
        self
    }

    /// Record a new review decision, then fan it out.
    pub async fn create_review(&self, new_review: NewReview) -> Result<Review> {
        let row = sqlx::query(
            r#"
            INSERT INTO reviews (id, post_id, reviewer_id, status, comment, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, post_id, reviewer_id, status, comment, reviewed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_review.post_id)
        .bind(new_review.reviewer_id)
        .bind(new_review.status.as_str())
        .bind(&new_review.comment)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        let review = review_from_row(&row)?;
        info!(review_id = %review.id, post_id = %review.post_id, status = %review.status, "review recorded");

        self.fan_out(&review).await;

        Ok(review)
    }

    pub async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query(
            r#"
            SELECT id, post_id, reviewer_id, status, comment, reviewed_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    pub async fn get_reviews(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, reviewer_id, status, comment, reviewed_at
            FROM reviews
            ORDER BY reviewed_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(review_from_row).collect()
    }

    /// Re-decide an existing review; the fresh `reviewed_at` makes the new
    /// event win the watermark race against any stale redelivery.
    pub async fn update_review(&self, id: Uuid, update: ReviewUpdate) -> Result<Option<Review>> {
        let row = sqlx::query(
            r#"
            UPDATE reviews
            SET post_id = $2, reviewer_id = $3, status = $4, comment = $5, reviewed_at = $6
            WHERE id = $1
            RETURNING id, post_id, reviewer_id, status, comment, reviewed_at
            "#,
        )
        .bind(id)
        .bind(update.post_id)
        .bind(update.reviewer_id)
        .bind(update.status.as_str())
        .bind(&update.comment)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let review = row.as_ref().map(review_from_row).transpose()?;

        if let Some(review) = &review {
            info!(review_id = %review.id, post_id = %review.post_id, status = %review.status, "review re-decided");
            self.fan_out(review).await;
        }

        Ok(review)
    }

    pub async fn delete_review(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_reviews_by_post(&self, post_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, reviewer_id, status, comment, reviewed_at
            FROM reviews
            WHERE post_id = $1
            ORDER BY reviewed_at DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(review_from_row).collect()
    }

    pub async fn get_reviews_by_status(&self, status: ReviewStatus) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, reviewer_id, status, comment, reviewed_at
            FROM reviews
            WHERE status = $1
            ORDER BY reviewed_at DESC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(review_from_row).collect()
    }

    /// Remove every review for a post. Idempotent: purging a post with no
    /// reviews deletes zero rows and is still success, which lets
    /// post-service retry a cascading delete safely.
    pub async fn delete_reviews_by_post(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        info!(%post_id, deleted, "reviews purged for post");
        metrics::REVIEWS_PURGED.inc_by(deleted);

        Ok(deleted)
    }

    /// Publish the decision event and nudge the editorial desk, both
    /// best-effort, after the review row has committed.
    async fn fan_out(&self, review: &Review) {
        publish_decision_best_effort(self.publisher.as_ref(), review).await;

        if let Some(notifier) = &self.notifier {
            let request = NotificationRequest {
                to: notifier.recipient.clone(),
                subject: format!("Review decision: {}", review.status),
                text: format!(
                    "Post {} was marked {} by reviewer {}.",
                    review.post_id, review.status, review.reviewer_id
                ),
            };
            notifier.client.send_best_effort(&request).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kafka::{MockReviewEventPublisher, PublishAck, PublishError};

    fn sample_review() -> Review {
        Review {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            status: ReviewStatus::Approved,
            comment: Some("solid sourcing".to_string()),
            reviewed_at: Utc::now(),
        }
    }

    #[test]
    fn test_decision_envelope_carries_the_review_fields() {
        let review = sample_review();
        let envelope = decision_envelope(&review);

        assert_eq!(envelope.event_type, event_schema::REVIEW_DECISION_EVENT_TYPE);
        assert_eq!(envelope.source, EVENT_SOURCE);
        assert_eq!(envelope.data.post_id, review.post_id);
        assert_eq!(envelope.data.status, review.status);
        assert_eq!(envelope.data.reviewer_comment, review.comment);
        assert_eq!(envelope.data.decided_at, review.reviewed_at);
    }

    #[tokio::test]
    async fn test_publish_success_is_acknowledged() {
        let review = sample_review();

        let mut publisher = MockReviewEventPublisher::new();
        publisher.expect_publish().times(1).returning(|envelope| {
            Ok(PublishAck {
                event_id: envelope.event_id,
            })
        });

        assert!(publish_decision_best_effort(&publisher, &review).await);
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        // A broker outage must not propagate into the review API path.
        let review = sample_review();

        let mut publisher = MockReviewEventPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(PublishError::Unavailable("all brokers down".to_string())));

        assert!(!publish_decision_best_effort(&publisher, &review).await);
    }
}
