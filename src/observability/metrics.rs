//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_rate_limited_total` (counter): requests rejected with 429
//! - `gate_csrf_rejected_total` (counter): requests rejected with 403
//! - `gate_sessions_issued_total` (counter): sessions created at login
//! - `gate_sessions_refreshed_total` (counter): cookies reissued near expiry
//! - `gate_sessions_revoked_total` (counter): cookie deletions sent
//! - `gate_rate_limit_tracked_clients` (gauge): clients held by the limiter
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited() {
    counter!("gate_rate_limited_total").increment(1);
}

pub fn record_csrf_rejected() {
    counter!("gate_csrf_rejected_total").increment(1);
}

pub fn record_session_issued() {
    counter!("gate_sessions_issued_total").increment(1);
}

pub fn record_session_refreshed() {
    counter!("gate_sessions_refreshed_total").increment(1);
}

pub fn record_session_revoked() {
    counter!("gate_sessions_revoked_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gate_rate_limit_tracked_clients").set(count as f64);
}
