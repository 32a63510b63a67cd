//! Prometheus metrics for review-service.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

lazy_static! {
    /// Decision events that reached the durable channel.
    pub static ref REVIEW_DECISIONS_PUBLISHED: IntCounter = register_int_counter!(
        "review_decisions_published_total",
        "Review decision events published to Kafka"
    )
    .expect("failed to register review_decisions_published_total");

    /// Decision events that failed to publish (status sync lags until retry).
    pub static ref REVIEW_DECISION_PUBLISH_FAILURES: IntCounter = register_int_counter!(
        "review_decision_publish_failures_total",
        "Review decision events that could not be published"
    )
    .expect("failed to register review_decision_publish_failures_total");

    /// Reviews removed through the per-post purge endpoint.
    pub static ref REVIEWS_PURGED: IntCounter = register_int_counter!(
        "reviews_purged_total",
        "Reviews deleted by the cascading purge endpoint"
    )
    .expect("failed to register reviews_purged_total");
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
