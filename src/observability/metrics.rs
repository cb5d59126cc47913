//! Metrics collection and exposition.
//!
//! # Metrics
//! - `counter_watch_submissions_total` (counter): submissions by outcome
//! - `counter_watch_blockchain_latency_seconds` (histogram): submit → on-chain clock
//! - `counter_watch_confirmation_latency_seconds` (histogram): submit → poll confirmation
//! - `counter_watch_ws_latency_seconds` (histogram): submit → WS notification
//! - `counter_watch_table_records` (gauge): live reconciliation entries
//! - `counter_watch_evictions_total` (counter): janitor removals by reason
//! - `counter_watch_ws_messages_total` (counter): listener messages by outcome

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on the given address. A bind failure is
/// logged, not fatal; the client keeps running without exposition.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(outcome: &'static str) {
    metrics::counter!("counter_watch_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_blockchain_latency(seconds: f64) {
    metrics::histogram!("counter_watch_blockchain_latency_seconds").record(seconds);
}

pub fn record_confirmation_latency(seconds: f64) {
    metrics::histogram!("counter_watch_confirmation_latency_seconds").record(seconds);
}

pub fn record_ws_latency(seconds: f64) {
    metrics::histogram!("counter_watch_ws_latency_seconds").record(seconds);
}

pub fn record_table_size(len: usize) {
    metrics::gauge!("counter_watch_table_records").set(len as f64);
}

pub fn record_eviction(reason: &'static str) {
    metrics::counter!("counter_watch_evictions_total", "reason" => reason).increment(1);
}

pub fn record_ws_message(outcome: &'static str) {
    metrics::counter!("counter_watch_ws_messages_total", "outcome" => outcome).increment(1);
}
