pub mod notifications;

pub use notifications::send_notification;
