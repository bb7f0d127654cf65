//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_attempts_total` (counter): attempts by outcome label
//! - `resilience_retries_total` (counter): retries by triggering kind or status
//! - `resilience_retry_delay_seconds` (histogram): waits taken before retries
//! - `resilience_exhausted_total` (counter): calls that ran out of retries
//! - `resilience_timeouts_total` (counter): attempts cut off by a deadline
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; no recorder means no cost
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::outcome::Outcome;

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(outcome: &Outcome) {
    counter!("resilience_attempts_total", "outcome" => outcome.label().into_owned()).increment(1);
}

pub fn record_retry(outcome: &Outcome, delay: Duration) {
    counter!("resilience_retries_total", "kind" => outcome.label().into_owned()).increment(1);
    histogram!("resilience_retry_delay_seconds").record(delay.as_secs_f64());
}

pub fn record_exhausted() {
    counter!("resilience_exhausted_total").increment(1);
}

pub fn record_timeout() {
    counter!("resilience_timeouts_total").increment(1);
}
