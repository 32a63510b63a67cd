pub mod notification_client;

pub use notification_client::{NotificationClient, NotificationRequest};
