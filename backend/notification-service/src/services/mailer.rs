/// SMTP mailer - sends notification emails through the configured relay.
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::error::AppError;
use crate::metrics;
use crate::models::Notification;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Build the outgoing message. Split out of `send` so address and header
/// handling is testable without an SMTP relay.
fn build_message(from: &Mailbox, notification: &Notification) -> Result<Message, AppError> {
    let to: Mailbox = notification
        .to
        .parse()
        .map_err(|_| AppError::ValidationError(format!("invalid recipient: {}", notification.to)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(notification.subject.clone())
        .body(notification.text.clone())
        .map_err(|e| AppError::Internal(e.to_string()))
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| AppError::Internal(format!("invalid SMTP_FROM address: {}", config.from)))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Internal(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Send one notification email. SMTP failures map to the upstream
    /// error so the caller sees an explicit 502 rather than a silent drop.
    pub async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let message = build_message(&self.from, notification)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(to = %notification.to, "notification email sent");
                metrics::EMAILS_SENT.inc();
                Ok(())
            }
            Err(e) => {
                error!(to = %notification.to, error = %e, "notification email failed");
                metrics::EMAIL_FAILURES.inc();
                Err(AppError::Upstream(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            to: "editor@newsroom.dev".to_string(),
            subject: "Review decision: approved".to_string(),
            text: "Post 42 was approved.".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        let from: Mailbox = "no-reply@newsroom.dev".parse().unwrap();
        let message = build_message(&from, &notification());
        assert!(message.is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let from: Mailbox = "no-reply@newsroom.dev".parse().unwrap();
        let bad = Notification {
            to: "not an address".to_string(),
            ..notification()
        };

        assert!(matches!(
            build_message(&from, &bad),
            Err(AppError::ValidationError(_))
        ));
    }
}
