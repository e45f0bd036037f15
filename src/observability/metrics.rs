//! Metrics collection and exposition.
//!
//! # Metrics
//! - `reflector_requests_total` (counter): requests by status code
//! - `reflector_request_duration_seconds` (histogram): handler latency
//! - `reflector_extraction_failures_total` (counter): requests answered with 500

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("reflector_requests_total", "Requests served by the reflector");
    describe_histogram!(
        "reflector_request_duration_seconds",
        "Time spent building the reflected payload"
    );
    describe_counter!(
        "reflector_extraction_failures_total",
        "Requests that failed during payload construction"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(status: u16, start: Instant) {
    counter!("reflector_requests_total", "status" => status.to_string()).increment(1);
    histogram!("reflector_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a payload construction failure.
pub fn record_extraction_failure() {
    counter!("reflector_extraction_failures_total").increment(1);
}
