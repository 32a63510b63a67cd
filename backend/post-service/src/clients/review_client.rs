/// HTTP client for review-service, used by the cascading delete coordinator
/// to purge the reviews that depend on a post before its local row goes away.
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Remote call failure. All variants mean the purge cannot be confirmed and
/// the caller must abort its local deletion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("review-service timed out")]
    Timeout,

    #[error("review-service unreachable: {0}")]
    Unreachable(String),

    #[error("review-service returned status {0}")]
    Status(u16),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewPurgeClient: Send + Sync {
    /// Remove every review attached to `post_id` on the review side.
    ///
    /// Idempotent by contract: purging a post with no reviews is success.
    async fn purge_reviews_for_post(&self, post_id: Uuid) -> Result<(), RemoteError>;
}

pub struct HttpReviewPurgeClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpReviewPurgeClient {
    /// Build a client with a bounded request timeout. The purge call blocks
    /// a user-facing delete request, so an unbounded wait is not acceptable.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ReviewPurgeClient for HttpReviewPurgeClient {
    async fn purge_reviews_for_post(&self, post_id: Uuid) -> Result<(), RemoteError> {
        let url = format!("{}/api/v1/reviews/post/{}", self.base_url, post_id);

        match self.http.delete(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(%post_id, "reviews purged");
                Ok(())
            }
            // An unknown post has an empty review set; deleting it is success.
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => Ok(()),
            Ok(resp) => Err(RemoteError::Status(resp.status().as_u16())),
            Err(err) if err.is_timeout() => Err(RemoteError::Timeout),
            Err(err) => Err(RemoteError::Unreachable(err.to_string())),
        }
    }
}
