//! Metrics collection and exposition.
//!
//! # Metrics
//! - `storefront_requests_total` (counter): requests by method, status
//! - `storefront_request_duration_seconds` (histogram): end-to-end latency
//! - `storefront_backend_calls_total` (counter): backend calls by endpoint, outcome
//! - `storefront_backend_call_duration_seconds` (histogram): backend latency by endpoint
//! - `storefront_csrf_rejections_total` (counter): requests failing the CSRF check
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed inbound request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!(
        "storefront_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "storefront_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one backend call. `outcome` is the status code or `"error"`.
pub fn record_backend_call(endpoint: &'static str, outcome: &str, start: Instant) {
    counter!(
        "storefront_backend_calls_total",
        "endpoint" => endpoint,
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("storefront_backend_call_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_csrf_rejection(reason: &'static str) {
    counter!("storefront_csrf_rejections_total", "reason" => reason).increment(1);
}
