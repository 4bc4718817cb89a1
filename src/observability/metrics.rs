//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define presenter metrics (requests, backend calls, proxying, reloads)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `presenter_requests_total` (counter): pages presented, by status
//! - `presenter_request_duration_seconds` (histogram): page latency
//! - `presenter_backend_calls_total` (counter): backend calls, by call and outcome
//! - `presenter_backend_call_duration_seconds` (histogram): backend latency, by call
//! - `presenter_proxy_requests_total` (counter): proxied requests, by site and status
//! - `presenter_routing_reloads_total` (counter): routing table reloads, by outcome
//!
//! # Design Decisions
//! - Macros are no-ops until a recorder is installed
//! - Exporter only started when enabled in config

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::context::BackendCall;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("presenter_requests_total", "status" => status.to_string()).increment(1);
    histogram!("presenter_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_backend_call(call: BackendCall, outcome: &str, elapsed: Duration) {
    counter!(
        "presenter_backend_calls_total",
        "call" => call.field_name(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("presenter_backend_call_duration_seconds", "call" => call.field_name())
        .record(elapsed.as_secs_f64());
}

pub fn record_proxy(site: &str, status: u16) {
    counter!(
        "presenter_proxy_requests_total",
        "site" => site.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_reload(outcome: &'static str) {
    counter!("presenter_routing_reloads_total", "outcome" => outcome).increment(1);
}
