pub mod review_status;

pub use review_status::{ReviewStatusApplier, ReviewStatusConsumer, ReviewStatusConsumerConfig};
