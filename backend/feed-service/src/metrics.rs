//! Prometheus metrics for feed-service.
//!
//! Exposes feed collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Post operations segmented by operation and outcome.
    pub static ref POST_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_post_operations_total",
        "Post operations segmented by operation and result",
        &["operation", "result"]
    )
    .expect("failed to register feed_post_operations_total");

    /// Like toggles by direction (like/dislike).
    pub static ref LIKE_TOGGLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_like_toggles_total",
        "Like toggles segmented by direction",
        &["direction"]
    )
    .expect("failed to register feed_like_toggles_total");

    /// Image parts seen by the upload filter, by outcome.
    pub static ref IMAGE_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_image_uploads_total",
        "Image uploads segmented by filter outcome",
        &["outcome"]
    )
    .expect("failed to register feed_image_uploads_total");
}

pub fn record_operation(operation: &str, ok: bool) {
    POST_OPERATIONS_TOTAL
        .with_label_values(&[operation, if ok { "success" } else { "error" }])
        .inc();
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
