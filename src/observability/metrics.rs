//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): viewer requests by behavior, status
//! - `edge_request_duration_seconds` (histogram): latency by behavior
//! - `edge_stage_anomalies_total` (counter): degraded stage results by stage, kind
//! - `edge_origin_errors_total` (counter): failed origin fetches by origin

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed viewer request.
pub fn record_request(behavior: &str, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "behavior" => behavior.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds", "behavior" => behavior.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a stage anomaly.
pub fn record_anomaly(stage: &'static str, kind: &'static str) {
    metrics::counter!("edge_stage_anomalies_total", "stage" => stage, "kind" => kind).increment(1);
}

/// Record a failed origin fetch.
pub fn record_origin_error(origin: &str) {
    metrics::counter!("edge_origin_errors_total", "origin" => origin.to_string()).increment(1);
}
