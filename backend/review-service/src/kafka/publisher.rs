//! Kafka publisher for review decision events.
//!
//! Publishes each recorded decision to the durable review events topic,
//! keyed by `post_id` so the transport can partition per post. The producer
//! runs with idempotence enabled and `acks=all`; transient broker failures
//! are retried under the shared delivery policy before the error is handed
//! back to the caller.

use async_trait::async_trait;
use delivery_policy::{retry, DeliveryPolicy};
use event_schema::{codec, EventEnvelope, ReviewDecisionEvent};
use rdkafka::error::KafkaError;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Acknowledgment that the event reached the durable channel.
#[derive(Debug, Clone, Copy)]
pub struct PublishAck {
    pub event_id: Uuid,
}

/// Publish failure modes. `Unavailable` is worth retrying at a higher
/// level; `Rejected` means the channel refused the record and a retry with
/// the same bytes will refuse again.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    #[error("event channel unavailable: {0}")]
    Unavailable(String),

    #[error("event rejected by channel: {0}")]
    Rejected(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewEventPublisher: Send + Sync {
    /// Enqueue a decision event to the durable, at-least-once channel.
    ///
    /// Must only be called after the review row itself is durably stored;
    /// publishing first would advertise a decision that could still be
    /// rolled back.
    async fn publish(
        &self,
        envelope: &EventEnvelope<ReviewDecisionEvent>,
    ) -> Result<PublishAck, PublishError>;
}

pub struct KafkaReviewEventPublisher {
    producer: FutureProducer,
    topic: String,
    policy: DeliveryPolicy,
    delivery_timeout: Duration,
}

impl KafkaReviewEventPublisher {
    pub fn new(
        brokers: &str,
        topic: impl Into<String>,
        policy: DeliveryPolicy,
        delivery_timeout: Duration,
    ) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.into(),
            policy,
            delivery_timeout,
        })
    }

    async fn send_once(
        &self,
        key: &str,
        payload: &[u8],
        headers: &OwnedHeaders,
    ) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic)
            .key(key)
            .payload(payload)
            .headers(headers.clone());

        self.producer
            .send(record, self.delivery_timeout)
            .await
            .map(|_| ())
            .map_err(|(err, _)| classify(err))
    }
}

fn classify(err: KafkaError) -> PublishError {
    match err {
        KafkaError::MessageProduction(
            RDKafkaErrorCode::QueueFull
            | RDKafkaErrorCode::MessageTimedOut
            | RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::NotEnoughReplicas,
        ) => PublishError::Unavailable(err.to_string()),
        other => PublishError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl ReviewEventPublisher for KafkaReviewEventPublisher {
    async fn publish(
        &self,
        envelope: &EventEnvelope<ReviewDecisionEvent>,
    ) -> Result<PublishAck, PublishError> {
        let payload = codec::encode_review_decision(envelope)
            .map_err(|e| PublishError::Rejected(e.to_string()))?;

        let key = envelope.data.post_id.to_string();
        let event_id = envelope.event_id.to_string();
        let schema_version = envelope.schema_version.to_string();

        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event_type",
                value: Some(envelope.event_type.as_bytes()),
            })
            .insert(Header {
                key: "event_id",
                value: Some(event_id.as_bytes()),
            })
            .insert(Header {
                key: "schema_version",
                value: Some(schema_version.as_bytes()),
            });

        // Retry unavailability under the shared policy; a rejection is
        // terminal and breaks out immediately.
        let attempt = retry(&self.policy, || async {
            match self.send_once(&key, &payload, &headers).await {
                Ok(()) => Ok(Ok(())),
                Err(rejected @ PublishError::Rejected(_)) => Ok(Err(rejected)),
                Err(unavailable) => Err(unavailable),
            }
        })
        .await;

        match attempt {
            Ok(Ok(())) => {
                debug!(
                    event_id = %envelope.event_id,
                    post_id = %envelope.data.post_id,
                    topic = %self.topic,
                    "review decision event published"
                );
                Ok(PublishAck {
                    event_id: envelope.event_id,
                })
            }
            Ok(Err(rejected)) => Err(rejected),
            Err(exhausted) => Err(exhausted.last_error),
        }
    }
}
