//! Metrics collection and exposition.
//!
//! # Metrics
//! - `imgproxy_requests_total` (counter): total requests by action, status
//! - `imgproxy_request_duration_seconds` (histogram): latency distribution
//! - `imgproxy_host_rejections_total` (counter): allow-list denials
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for action and status code
//! - Exporter runs on its own address, separate from proxy traffic

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
///
/// A failed install is logged and otherwise ignored; the proxy serves
/// traffic without metrics rather than refusing to start.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus exporter");
        }
    }
}

/// Record one completed request.
pub fn record_request(action: &str, status: u16, start_time: Instant) {
    let labels = [
        ("action", action.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("imgproxy_requests_total", &labels).increment(1);
    metrics::histogram!("imgproxy_request_duration_seconds", &labels)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a security-relevant allow-list rejection.
pub fn record_host_rejection() {
    metrics::counter!("imgproxy_host_rejections_total").increment(1);
}
