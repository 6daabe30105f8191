//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_dispatch_total` (counter): dispatches by route, status
//! - `rpc_dispatch_duration_seconds` (histogram): dispatch latency by route
//! - `rpc_active_connections` (gauge): open stream connections
//! - `rpc_datagrams_dropped_total` (counter): packets dropped by reason
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(route: &str, status: u16, start: Instant) {
    counter!(
        "rpc_dispatch_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("rpc_dispatch_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_connection_opened() {
    gauge!("rpc_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    gauge!("rpc_active_connections").decrement(1.0);
}

pub fn record_datagram_dropped(reason: &'static str) {
    counter!("rpc_datagrams_dropped_total", "reason" => reason).increment(1);
}
