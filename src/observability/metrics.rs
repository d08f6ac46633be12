//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devserver_requests_total` (counter): requests by kind, method, status, route
//! - `devserver_request_duration_seconds` (histogram): latency distribution
//! - `devserver_upstream_failures_total` (counter): relay failures by route

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Which side of the front door answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Proxy,
    Static,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Proxy => "proxy",
            RequestKind::Static => "static",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(kind: RequestKind, method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "devserver_requests_total",
        "kind" => kind.as_str(),
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!(
        "devserver_request_duration_seconds",
        "kind" => kind.as_str(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(route: &str) {
    counter!("devserver_upstream_failures_total", "route" => route.to_string()).increment(1);
}
