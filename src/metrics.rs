//! Prometheus metrics & middleware helper.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, Registry};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

fn counter(name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("counter definition");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("counter registration");
    c
}

/// Matches appended through the incremental path.
pub static MATCHES_RECORDED: Lazy<IntCounter> = Lazy::new(|| {
    counter(
        "ladder_matches_recorded_total",
        "Matches appended to the ledger",
    )
});

/// Full replays run after a deletion or correction.
pub static REPLAYS_RUN: Lazy<IntCounter> =
    Lazy::new(|| counter("ladder_replays_total", "Full standings replays"));

/// Swallowed label-collaborator failures (best-effort sync).
pub static LABEL_SYNC_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    counter(
        "ladder_label_sync_failures_total",
        "Label grant/revoke/list calls that failed and were skipped",
    )
});

/// HTTP middleware exposing [`REGISTRY`] (plus request metrics) at /metrics.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .registry(REGISTRY.clone())
        .build()
        .expect("metrics builder")
});
