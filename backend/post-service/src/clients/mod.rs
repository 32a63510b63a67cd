pub mod review_client;

pub use review_client::{HttpReviewPurgeClient, RemoteError, ReviewPurgeClient};

#[cfg(test)]
pub use review_client::MockReviewPurgeClient;
