//! Kafka consumer for review decision events.
//!
//! Listens on the review events topic and applies each decision to the
//! addressed post. Delivery is at-least-once and unordered, so the applier
//! has to be idempotent and stale-proof: a per-post watermark rejects
//! decisions older than the one already applied, and deliveries for the
//! same post are serialized through a keyed lock so two redeliveries cannot
//! both pass the watermark check against a stale read.
//!
//! Offsets are stored only after a message has been handled. An unstored
//! offset is this consumer's negative acknowledgment: the transport
//! redelivers it after a restart or rebalance instead of losing it.

use delivery_policy::{retry, DeliveryPolicy, KafkaDeadLetterPublisher};
use event_schema::{codec, ReviewDecisionEvent};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::ClientConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{ApplyOutcome, PostRepository};
use crate::metrics;

/// Kafka consumer configuration
#[derive(Clone, Debug)]
pub struct ReviewStatusConsumerConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

/// Per-post locks serializing status application for the same post.
/// Distinct posts proceed fully in parallel.
struct PostLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl PostLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, post_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(post_id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Transient failure while applying a decision. The delivery policy retries
/// these; exhaustion moves the event to the dead-letter topic rather than
/// dropping it.
#[derive(Debug, thiserror::Error)]
#[error("transient apply failure: {0}")]
pub struct ApplyError(String);

/// Applies review decisions to posts, transport-free.
///
/// Separated from the Kafka plumbing so the idempotency and ordering rules
/// can be exercised directly in tests.
pub struct ReviewStatusApplier {
    repo: Arc<dyn PostRepository>,
    locks: PostLocks,
}

impl ReviewStatusApplier {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self {
            repo,
            locks: PostLocks::new(),
        }
    }

    /// Apply one decision. Safe to call any number of times with the same
    /// event; applying a duplicate leaves state unchanged.
    pub async fn apply(&self, event: &ReviewDecisionEvent) -> Result<ApplyOutcome, ApplyError> {
        let _guard = self.locks.acquire(event.post_id).await;

        let outcome = self
            .repo
            .apply_review_status(event.post_id, event.status, event.decided_at)
            .await
            .map_err(|e| ApplyError(e.to_string()))?;

        match outcome {
            ApplyOutcome::Applied => {
                info!(
                    post_id = %event.post_id,
                    status = %event.status,
                    decided_at = %event.decided_at,
                    "review decision applied to post"
                );
                metrics::REVIEW_EVENTS_APPLIED.inc();
            }
            ApplyOutcome::Stale => {
                debug!(
                    post_id = %event.post_id,
                    decided_at = %event.decided_at,
                    "stale review decision discarded"
                );
                metrics::REVIEW_EVENTS_STALE.inc();
            }
            ApplyOutcome::NotFound => {
                // Not an error: the post may have been deleted while the
                // event was in flight, or the event is from an unknown
                // origin. The consumer moves on.
                warn!(
                    post_id = %event.post_id,
                    "review decision for unknown post, dropped"
                );
                metrics::REVIEW_EVENTS_UNMATCHED.inc();
            }
        }

        Ok(outcome)
    }
}

/// Kafka consumer binding the applier to the review events topic.
pub struct ReviewStatusConsumer {
    consumer: StreamConsumer,
    applier: Arc<ReviewStatusApplier>,
    dead_letters: KafkaDeadLetterPublisher,
    policy: DeliveryPolicy,
    topic: String,
    shutdown_rx: watch::Receiver<bool>,
}

impl ReviewStatusConsumer {
    pub fn new(
        config: &ReviewStatusConsumerConfig,
        applier: Arc<ReviewStatusApplier>,
        dead_letters: KafkaDeadLetterPublisher,
        policy: DeliveryPolicy,
        shutdown_rx: watch::Receiver<bool>,
    ) -> crate::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            // Offsets are stored manually after successful handling; an
            // unstored offset means redelivery, not loss.
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .map_err(|e| {
                crate::AppError::Internal(format!("Failed to create Kafka consumer: {e}"))
            })?;

        consumer.subscribe(&[&config.topic]).map_err(|e| {
            crate::AppError::Internal(format!("Failed to subscribe to topic: {e}"))
        })?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "review status consumer initialized"
        );

        Ok(Self {
            consumer,
            applier,
            dead_letters,
            policy,
            topic: config.topic.clone(),
            shutdown_rx,
        })
    }

    /// Run the consumer loop until shutdown is signalled.
    pub async fn run(&mut self) -> crate::Result<()> {
        use futures::StreamExt;

        info!("starting review status consumer loop");

        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping consumer");
                        break;
                    }
                }

                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            if self.process_message(&msg).await {
                                if let Err(e) = self.consumer.store_offset_from_message(&msg) {
                                    warn!(error = %e, "failed to store offset");
                                }
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka consumer error");
                            // Keep consuming; the broker recovers on its own.
                        }
                        None => {
                            warn!("message stream ended unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        info!("review status consumer stopped");
        Ok(())
    }

    /// Handle one delivery. Returns whether the offset may be stored.
    async fn process_message(&self, msg: &BorrowedMessage<'_>) -> bool {
        let payload = match msg.payload() {
            Some(p) => p,
            None => {
                debug!("empty message payload, skipping");
                return true;
            }
        };

        let key = msg
            .key()
            .and_then(|k| std::str::from_utf8(k).ok())
            .map(str::to_string);

        let envelope = match codec::decode_review_decision(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Malformed or foreign schema: non-retryable, park it for
                // manual inspection instead of dropping or looping on it.
                return self.dead_letter(key.as_deref(), payload, &e.to_string()).await;
            }
        };

        debug!(
            event_id = %envelope.event_id,
            post_id = %envelope.data.post_id,
            "received review decision event"
        );

        match retry(&self.policy, || self.applier.apply(&envelope.data)).await {
            Ok(_) => true,
            Err(exhausted) => {
                self.dead_letter(key.as_deref(), payload, &exhausted.to_string())
                    .await
            }
        }
    }

    /// Move a message to the dead-letter topic. Returns whether the offset
    /// may be stored; a failed dead-letter publish keeps the offset
    /// unstored so the message comes back.
    async fn dead_letter(&self, key: Option<&str>, payload: &[u8], reason: &str) -> bool {
        metrics::REVIEW_EVENTS_DEAD_LETTERED.inc();
        match self.dead_letters.send(&self.topic, key, payload, reason).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "dead-letter publish failed, message will be redelivered");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepoError;
    use crate::models::{NewPost, Post, PostSearch, PostUpdate};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use event_schema::ReviewStatus;

    /// In-memory post store implementing the same watermark contract as the
    /// SQL repository.
    struct InMemoryPosts {
        posts: Mutex<HashMap<Uuid, Post>>,
    }

    impl InMemoryPosts {
        fn with_post(post: Post) -> Arc<Self> {
            let mut posts = HashMap::new();
            posts.insert(post.id, post);
            Arc::new(Self {
                posts: Mutex::new(posts),
            })
        }

        async fn get(&self, id: Uuid) -> Option<Post> {
            self.posts.lock().await.get(&id).cloned()
        }
    }

    #[async_trait]
    impl PostRepository for InMemoryPosts {
        async fn create(&self, _new_post: NewPost) -> Result<Post, RepoError> {
            unreachable!("not used by applier tests")
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.get(id).await)
        }

        async fn list(&self) -> Result<Vec<Post>, RepoError> {
            unreachable!("not used by applier tests")
        }

        async fn search(&self, _filter: PostSearch) -> Result<Vec<Post>, RepoError> {
            unreachable!("not used by applier tests")
        }

        async fn update(&self, _id: Uuid, _update: PostUpdate) -> Result<Option<Post>, RepoError> {
            unreachable!("not used by applier tests")
        }

        async fn exists(&self, id: Uuid) -> Result<bool, RepoError> {
            Ok(self.get(id).await.is_some())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
            Ok(self.posts.lock().await.remove(&id).is_some())
        }

        async fn apply_review_status(
            &self,
            post_id: Uuid,
            status: ReviewStatus,
            decided_at: chrono::DateTime<Utc>,
        ) -> Result<ApplyOutcome, RepoError> {
            let mut posts = self.posts.lock().await;
            match posts.get_mut(&post_id) {
                None => Ok(ApplyOutcome::NotFound),
                Some(post) => {
                    if post.last_decision_at.map_or(true, |w| w <= decided_at) {
                        post.status = status;
                        post.last_decision_at = Some(decided_at);
                        post.updated_at = Utc::now();
                        Ok(ApplyOutcome::Applied)
                    } else {
                        Ok(ApplyOutcome::Stale)
                    }
                }
            }
        }
    }

    fn draft_post() -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: "City council vote".to_string(),
            content: "The council voted 7-2 on the budget.".to_string(),
            author: "imalik".to_string(),
            category: "politics".to_string(),
            status: ReviewStatus::Draft,
            last_decision_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn decision(post_id: Uuid, status: ReviewStatus, decided_at: chrono::DateTime<Utc>) -> ReviewDecisionEvent {
        ReviewDecisionEvent {
            post_id,
            status,
            reviewer_comment: None,
            decided_at,
        }
    }

    #[tokio::test]
    async fn test_applying_twice_equals_applying_once() {
        let post = draft_post();
        let post_id = post.id;
        let store = InMemoryPosts::with_post(post);
        let applier = ReviewStatusApplier::new(store.clone());

        let event = decision(post_id, ReviewStatus::Approved, Utc::now());

        applier.apply(&event).await.unwrap();
        let after_first = store.get(post_id).await.unwrap();

        // Redelivery of the same event
        applier.apply(&event).await.unwrap();
        let after_second = store.get(post_id).await.unwrap();

        assert_eq!(after_first.status, ReviewStatus::Approved);
        assert_eq!(after_first.status, after_second.status);
        assert_eq!(after_first.last_decision_at, after_second.last_decision_at);
    }

    #[tokio::test]
    async fn test_stale_event_cannot_revert_newer_status() {
        let post = draft_post();
        let post_id = post.id;
        let store = InMemoryPosts::with_post(post);
        let applier = ReviewStatusApplier::new(store.clone());

        let t2 = Utc::now();
        let t1 = t2 - Duration::seconds(30);

        let newer = decision(post_id, ReviewStatus::Published, t2);
        let older = decision(post_id, ReviewStatus::Rejected, t1);

        assert_eq!(applier.apply(&newer).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(applier.apply(&older).await.unwrap(), ApplyOutcome::Stale);

        let post = store.get(post_id).await.unwrap();
        assert_eq!(post.status, ReviewStatus::Published);
        assert_eq!(post.last_decision_at, Some(t2));
    }

    #[tokio::test]
    async fn test_unknown_post_is_a_non_fatal_miss() {
        let store = InMemoryPosts::with_post(draft_post());
        let applier = ReviewStatusApplier::new(store);

        let event = decision(Uuid::new_v4(), ReviewStatus::Approved, Utc::now());
        assert_eq!(applier.apply(&event).await.unwrap(), ApplyOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_converge_on_newest_decision() {
        // Two decisions for the same post racing each other must always end
        // with the newer one's status, whichever arrives first.
        for _ in 0..50 {
            let post = draft_post();
            let post_id = post.id;
            let store = InMemoryPosts::with_post(post);
            let applier = Arc::new(ReviewStatusApplier::new(store.clone()));

            let t2 = Utc::now();
            let t1 = t2 - Duration::milliseconds(500);

            let older = decision(post_id, ReviewStatus::Rejected, t1);
            let newer = decision(post_id, ReviewStatus::Published, t2);

            let a = {
                let applier = Arc::clone(&applier);
                tokio::spawn(async move { applier.apply(&older).await })
            };
            let b = {
                let applier = Arc::clone(&applier);
                tokio::spawn(async move { applier.apply(&newer).await })
            };

            a.await.unwrap().unwrap();
            b.await.unwrap().unwrap();

            let post = store.get(post_id).await.unwrap();
            assert_eq!(post.status, ReviewStatus::Published);
            assert_eq!(post.last_decision_at, Some(t2));
        }
    }
}
