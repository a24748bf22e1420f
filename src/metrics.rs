// Prometheus metrics definitions for the huntlog backend.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Users currently mid-flow, between size and monster selection.
    pub static ref PENDING_SELECTIONS: IntGauge =
        IntGauge::new("huntlog_pending_selections", "Users awaiting a monster choice").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Commands handled, by command name and result.
    pub static ref COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("huntlog_commands_total", "Commands handled"),
        &["command", "result"],
    )
    .unwrap();

    /// Encounters written to the store, by size tier.
    pub static ref ENCOUNTERS_RECORDED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("huntlog_encounters_recorded_total", "Encounters recorded"),
        &["size"],
    )
    .unwrap();

    /// Catalog fetches that failed, by language.
    pub static ref CATALOG_FETCH_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("huntlog_catalog_fetch_failures_total", "Failed catalog fetches"),
        &["language"],
    )
    .unwrap();
}

/// Register all metrics with the registry. Call once at startup.
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(PENDING_SELECTIONS.clone()))
        .expect("failed to register metric");
    REGISTRY
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .expect("failed to register metric");
    REGISTRY
        .register(Box::new(ENCOUNTERS_RECORDED_TOTAL.clone()))
        .expect("failed to register metric");
    REGISTRY
        .register(Box::new(CATALOG_FETCH_FAILURES_TOTAL.clone()))
        .expect("failed to register metric");
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
