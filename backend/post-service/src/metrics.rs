//! Prometheus metrics for post-service.
//!
//! Exposes review-status consumer collectors and an HTTP handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

lazy_static! {
    /// Review decisions applied onto posts.
    pub static ref REVIEW_EVENTS_APPLIED: IntCounter = register_int_counter!(
        "review_events_applied_total",
        "Review decision events applied to posts"
    )
    .expect("failed to register review_events_applied_total");

    /// Review decisions discarded because an equal-or-newer one was applied.
    pub static ref REVIEW_EVENTS_STALE: IntCounter = register_int_counter!(
        "review_events_stale_total",
        "Review decision events discarded as older than the post watermark"
    )
    .expect("failed to register review_events_stale_total");

    /// Review decisions addressed to posts this service does not know.
    pub static ref REVIEW_EVENTS_UNMATCHED: IntCounter = register_int_counter!(
        "review_events_unmatched_total",
        "Review decision events dropped because the post does not exist"
    )
    .expect("failed to register review_events_unmatched_total");

    /// Messages parked on the dead-letter topic.
    pub static ref REVIEW_EVENTS_DEAD_LETTERED: IntCounter = register_int_counter!(
        "review_events_dead_lettered_total",
        "Review event messages moved to the dead-letter topic"
    )
    .expect("failed to register review_events_dead_lettered_total");
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
