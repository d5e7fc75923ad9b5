//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nse_proxy_requests_total` (counter): requests by route, status
//! - `nse_proxy_request_duration_seconds` (histogram): latency by route
//! - `nse_proxy_upstream_calls_total` (counter): upstream calls by endpoint, outcome
//! - `nse_proxy_session_resets_total` (counter): sessions re-established
//! - `nse_proxy_history_attempts` (histogram): source calls per history lookup
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "nse_proxy_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "nse_proxy_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_call(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!(
        "nse_proxy_upstream_calls_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_session_reset() {
    metrics::counter!("nse_proxy_session_resets_total").increment(1);
}

pub fn record_history_attempts(attempts: u32) {
    metrics::histogram!("nse_proxy_history_attempts").record(f64::from(attempts));
}
