/// HTTP client for notification-service.
///
/// Review decisions trigger an email to the editorial desk. Delivery is
/// best-effort from this service's point of view: a failure is logged and
/// never blocks the review API response.
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    pub to: String,
    pub subject: String,
    pub text: String,
}

pub struct NotificationClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotificationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fire a notification request; logs and swallows failures.
    pub async fn send_best_effort(&self, request: &NotificationRequest) {
        let url = format!("{}/api/v1/notifications", self.base_url);

        match self.http.post(&url).json(request).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(to = %request.to, "notification request accepted");
            }
            Ok(resp) => {
                warn!(
                    to = %request.to,
                    status = %resp.status(),
                    "notification request rejected"
                );
            }
            Err(err) => {
                warn!(to = %request.to, error = %err, "notification request failed");
            }
        }
    }
}
