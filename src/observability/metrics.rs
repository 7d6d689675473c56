//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_admissions_total` (counter): pipeline outcomes by terminal state
//!   (`allowed`, `network_blocked`, `invalid_token`, `rate_limited`)
//! - `gate_requests_total` (counter): HTTP responses by method and status
//!
//! # Design Decisions
//! - Low-overhead updates (atomic counter increments)
//! - Exposition via a Prometheus scrape endpoint on its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one admission pipeline outcome.
pub fn record_admission(outcome: &'static str) {
    metrics::counter!("gate_admissions_total", "outcome" => outcome).increment(1);
}

/// Count one HTTP response.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
