pub mod publisher;

pub use publisher::{
    KafkaReviewEventPublisher, PublishAck, PublishError, ReviewEventPublisher,
};

#[cfg(test)]
pub use publisher::MockReviewEventPublisher;
