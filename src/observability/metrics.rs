//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define debug-server request metrics
//! - Expose a Prometheus-compatible rendering handle
//!
//! # Metrics
//! - `debug_http_requests_total` (counter): requests by method, status
//! - `debug_http_request_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - The recorder is installed once by the supervisor; without it the
//!   macros are no-ops, which keeps handlers testable in isolation

use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUESTS_TOTAL: &str = "debug_http_requests_total";
pub const REQUEST_DURATION: &str = "debug_http_request_duration_seconds";

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("a global metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Build a Prometheus recorder and its rendering handle.
pub fn build_recorder() -> (PrometheusRecorder, PrometheusHandle) {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    (recorder, handle)
}

/// Install the process-wide recorder and return its rendering handle.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let (recorder, handle) = build_recorder();
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInstalled)?;
    describe();
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(REQUESTS_TOTAL, "Debug server requests by method and status");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "Debug server request latency"
    );
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}
