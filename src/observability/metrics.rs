//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxy requests by branch, status
//! - `gateway_request_duration_seconds` (histogram): time to response head
//! - `gateway_upstream_failures_total` (counter): failed origin fetches
//! - `gateway_rewrite_faults_total` (counter): attributes left unmodified, by kind
//!
//! # Design Decisions
//! - The `metrics` facade is used directly from call sites; the Prometheus
//!   exporter is only installed when enabled in config
//! - Branch label is one of `html`, `passthrough`, `error`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Response was rewritten by the HTML pipeline.
pub const BRANCH_HTML: &str = "html";
/// Response body was forwarded unmodified.
pub const BRANCH_PASSTHROUGH: &str = "passthrough";
/// Request ended in a JSON error envelope.
pub const BRANCH_ERROR: &str = "error";

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("gateway_requests_total", "Proxy requests by branch and status");
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Time from request to response head in seconds"
    );
    describe_counter!("gateway_upstream_failures_total", "Origin fetches that failed");
    describe_counter!(
        "gateway_rewrite_faults_total",
        "URL attributes left unmodified because they could not be resolved"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished proxy request.
pub fn record_request(branch: &'static str, status: u16, start: Instant) {
    counter!("gateway_requests_total", "branch" => branch, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "branch" => branch)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure() {
    counter!("gateway_upstream_failures_total").increment(1);
}

pub fn record_rewrite_fault(kind: &'static str) {
    counter!("gateway_rewrite_faults_total", "kind" => kind).increment(1);
}
