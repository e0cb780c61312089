//! Prometheus metrics for discovery-service.
//!
//! Feed ranking and interaction collectors plus the `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Duration of rank_feed calls by sort key.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "discovery_feed_request_duration_seconds",
        "Feed ranking duration segmented by sort key",
        &["sort"]
    )
    .expect("failed to register discovery_feed_request_duration_seconds");

    /// Total rank_feed calls by sort key and outcome.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discovery_feed_request_total",
        "Total feed ranking requests segmented by sort key and outcome",
        &["sort", "outcome"]
    )
    .expect("failed to register discovery_feed_request_total");

    /// Candidates surviving the filter per request.
    pub static ref FEED_CANDIDATE_COUNT: HistogramVec = register_histogram_vec!(
        "discovery_feed_candidate_count",
        "Number of candidates ranked per request segmented by sort key",
        &["sort"]
    )
    .expect("failed to register discovery_feed_candidate_count");

    /// Geo filters dropped because of unusable coordinates.
    pub static ref GEO_FILTER_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "discovery_geo_filter_skipped_total",
        "Geo filters skipped due to invalid latitude, longitude or radius"
    )
    .expect("failed to register discovery_geo_filter_skipped_total");

    /// Interaction writes by kind and result (added/removed/recorded).
    pub static ref INTERACTION_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discovery_interaction_write_total",
        "Interaction mutations segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register discovery_interaction_write_total");

    /// HTTP request latency by method and status.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "discovery_http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register discovery_http_request_duration_seconds");
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
