//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_requests_total` (counter): completed requests by method, status
//! - `service_request_duration_seconds` (histogram): latency by method
//! - `service_error_responses_total` (counter): translated errors by kind
//! - `service_panics_total` (counter): handler panics recovered
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "service_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "service_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_error_response(kind: &'static str) {
    metrics::counter!("service_error_responses_total", "kind" => kind).increment(1);
}

pub fn record_panic() {
    metrics::counter!("service_panics_total").increment(1);
}
