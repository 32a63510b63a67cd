//! Dead-letter holding area for messages that exhausted the delivery policy.
//!
//! A dead-lettered message keeps its original payload untouched so it can be
//! replayed manually; the failure reason and origin travel in headers.

use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::error;

/// Dead-letter topic companion for a given topic.
pub fn dead_letter_topic(topic: &str) -> String {
    format!("{topic}.dlq")
}

#[derive(Debug, thiserror::Error)]
#[error("dead-letter publish failed: {0}")]
pub struct DeadLetterError(String);

/// Publishes exhausted or undecodable messages to the companion `.dlq` topic.
pub struct KafkaDeadLetterPublisher {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl KafkaDeadLetterPublisher {
    pub fn new(producer: FutureProducer, delivery_timeout: Duration) -> Self {
        Self {
            producer,
            delivery_timeout,
        }
    }

    /// Move a message to the dead-letter topic and raise the alert log.
    ///
    /// The payload is forwarded byte-for-byte; `reason` describes why the
    /// message could not be processed.
    pub async fn send(
        &self,
        original_topic: &str,
        key: Option<&str>,
        payload: &[u8],
        reason: &str,
    ) -> Result<(), DeadLetterError> {
        let topic = dead_letter_topic(original_topic);

        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "dead-letter-reason",
                value: Some(reason.as_bytes()),
            })
            .insert(Header {
                key: "original-topic",
                value: Some(original_topic.as_bytes()),
            });

        let mut record = FutureRecord::to(&topic).payload(payload).headers(headers);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, self.delivery_timeout)
            .await
            .map_err(|(err, _)| DeadLetterError(err.to_string()))?;

        // Alert hook: dead-lettered messages need manual replay.
        error!(
            original_topic = %original_topic,
            dead_letter_topic = %topic,
            reason = %reason,
            "message moved to dead-letter topic"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_letter_topic_naming() {
        assert_eq!(
            dead_letter_topic("newsroom.review.events"),
            "newsroom.review.events.dlq"
        );
    }
}
