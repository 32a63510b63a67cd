/// Data models for notification-service
use serde::Deserialize;
use validator::Validate;

/// An email send request. Request-scoped; notifications are not persisted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Notification {
    #[validate(email(message = "to must be a valid email address"))]
    pub to: String,
    #[validate(length(min = 1, max = 200, message = "subject must be 1-200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}
