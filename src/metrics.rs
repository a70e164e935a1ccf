//! Prometheus metrics collection for chatwarden.
//!
//! Exposed on an HTTP endpoint when `metrics.port` is set.
//!
//! - `warden_command_total{command}` - Commands handled by name
//! - `warden_command_duration_seconds{command}` - Command latency histogram
//! - `warden_command_errors_total{command,error}` - Failed commands by error code
//! - `warden_store_save_failures_total` - Store rewrites that did not reach disk
//! - `warden_store_load_failures_total` - Unreadable store files replaced by an empty document
//! - `warden_welcomes_sent_total` - Welcome messages posted
//! - `warden_search_queries_total{outcome}` - Lookups by outcome

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Registry behind `/metrics`.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Commands handled by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command latency by name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by name and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Store saves that failed; the in-memory document is ahead of the file.
pub static STORE_SAVE_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Store loads that fell back to an empty document.
pub static STORE_LOAD_FAILURES: OnceLock<IntCounter> = OnceLock::new();

pub static WELCOMES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Lookups by outcome (`answered`, `empty`, `failed`, `refused`).
pub static SEARCH_QUERIES: OnceLock<IntCounterVec> = OnceLock::new();

/// Create and register every metric. Recording before this is a no-op;
/// repeated calls keep the first set.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("warden_command_total", "Commands handled by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("warden_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("warden_command_errors_total", "Command errors by name and code"), &["command", "error"]));
    register!(STORE_SAVE_FAILURES, IntCounter::new("warden_store_save_failures_total", "Store rewrites that failed"));
    register!(STORE_LOAD_FAILURES, IntCounter::new("warden_store_load_failures_total", "Unreadable store files replaced by an empty document"));
    register!(WELCOMES_SENT, IntCounter::new("warden_welcomes_sent_total", "Welcome messages posted"));
    register!(SEARCH_QUERIES, IntCounterVec::new(Opts::new("warden_search_queries_total", "Lookups by outcome"), &["outcome"]));
}

/// Text exposition of everything registered, or an empty body if encoding fails.
pub fn gather_metrics() -> String {
    let mut body = String::new();
    if let Err(e) = TextEncoder::new().encode_utf8(&registry().gather(), &mut body) {
        tracing::error!(error = %e, "Prometheus text encoding failed");
        body.clear();
    }
    body
}

/// Count one handled command and observe its latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// `error` is a [`HandlerError::error_code`](crate::error::HandlerError::error_code) label.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_store_save_failure() {
    if let Some(c) = STORE_SAVE_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_store_load_failure() {
    if let Some(c) = STORE_LOAD_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_welcome_sent() {
    if let Some(c) = WELCOMES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_search(outcome: &str) {
    if let Some(c) = SEARCH_QUERIES.get() {
        c.with_label_values(&[outcome]).inc();
    }
}
