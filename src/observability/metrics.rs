//! Metrics collection and exposition.
//!
//! # Metrics
//! - `remote_probe_total` (counter): probes by server and resulting state
//! - `remote_state_changes_total` (counter): notified state changes by server
//! - `remote_server_up` (gauge): 1 when the last probe was Ok, else 0
//! - `remote_cycle_duration_seconds` (histogram): poll cycle latency by kind
//!
//! Recording is a no-op until a recorder is installed, so library users that
//! never call `init_metrics` pay nothing.

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::state::HealthState;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(server: &str, health: HealthState) {
    counter!("remote_probe_total", "server" => server.to_string(), "state" => health.as_str()).increment(1);
    let up = if health == HealthState::Ok { 1.0 } else { 0.0 };
    gauge!("remote_server_up", "server" => server.to_string()).set(up);
}

pub fn record_state_change(server: &str) {
    counter!("remote_state_changes_total", "server" => server.to_string()).increment(1);
}

pub fn record_cycle(kind: &'static str, started: Instant) {
    histogram!("remote_cycle_duration_seconds", "kind" => kind).record(started.elapsed().as_secs_f64());
}
