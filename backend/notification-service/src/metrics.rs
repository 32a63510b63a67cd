//! Prometheus metrics for notification-service.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

lazy_static! {
    /// Notification emails handed to the SMTP relay.
    pub static ref EMAILS_SENT: IntCounter = register_int_counter!(
        "notification_emails_sent_total",
        "Notification emails sent"
    )
    .expect("failed to register notification_emails_sent_total");

    /// Sends the SMTP relay refused or failed.
    pub static ref EMAIL_FAILURES: IntCounter = register_int_counter!(
        "notification_email_failures_total",
        "Notification emails that failed to send"
    )
    .expect("failed to register notification_email_failures_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
