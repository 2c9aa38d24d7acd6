//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): finished requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_rejections_total` (counter): policy rejections by code
//! - `proxy_rate_limited_total` (counter): requests turned away at the gate
//!
//! # Design Decisions
//! - Labels carry method/status/code only, never target hosts: metric
//!   cardinality stays bounded and nothing sensitive is exported
//! - Recording is a no-op until the exporter is installed, so tests and
//!   embedders pay nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a policy rejection (resolver, auth).
pub fn record_rejected(code: &'static str) {
    metrics::counter!("proxy_rejections_total", "code" => code).increment(1);
}

/// Record a request turned away by the rate limiter.
pub fn record_rate_limited() {
    metrics::counter!("proxy_rate_limited_total").increment(1);
}
