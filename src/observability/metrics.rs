//! Metrics collection.
//!
//! # Metrics
//! - `callback_probe_total` (counter): health probes by tier, outcome
//! - `callback_transitions_total` (counter): state transitions by from, to
//! - `callback_remote_calls_total` (counter): workflow calls by operation, outcome
//! - `callback_poll_attempts_total` (counter): status queries by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Recording can be switched off globally from configuration

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn metric recording on or off for the whole process.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn record_probe(tier: &'static str, healthy: bool) {
    if !enabled() {
        return;
    }
    let outcome = if healthy { "healthy" } else { "failed" };
    metrics::counter!("callback_probe_total", "tier" => tier, "outcome" => outcome).increment(1);
}

pub fn record_transition(from: &'static str, to: &'static str) {
    if !enabled() {
        return;
    }
    metrics::counter!("callback_transitions_total", "from" => from, "to" => to).increment(1);
}

pub fn record_remote_call(operation: &'static str, outcome: &'static str) {
    if !enabled() {
        return;
    }
    metrics::counter!(
        "callback_remote_calls_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_poll_attempt(outcome: &'static str) {
    if !enabled() {
        return;
    }
    metrics::counter!("callback_poll_attempts_total", "outcome" => outcome).increment(1);
}
