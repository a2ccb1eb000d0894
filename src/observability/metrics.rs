//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, admission outcomes, queries)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `storefront_requests_total` (counter): requests by method, status
//! - `storefront_request_duration_seconds` (histogram): latency distribution
//! - `storefront_admission_total` (counter): gate outcomes
//! - `storefront_queries_total` (counter): store calls by operation, outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels stay low-cardinality (no ids, no paths)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("storefront_requests_total", &labels).increment(1);
    metrics::histogram!("storefront_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record an admission gate outcome (`allowed`, `rate_limited`, `error`, ...).
pub fn record_admission(outcome: &'static str) {
    metrics::counter!("storefront_admission_total", "outcome" => outcome).increment(1);
}

/// Record a store call.
pub fn record_query(operation: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("storefront_queries_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}
