use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static CACHE_HITS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_cache_hits_total", "Extended info reads served from cache")
        .expect("register cache_hits_total")
});

pub static CACHE_MISSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_cache_misses_total", "Extended info reads that fell through to the store")
        .expect("register cache_misses_total")
});

pub static SAVES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_saves_total", "Accepted extended info submissions")
        .expect("register saves_total")
});

pub static DELETES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_deletes_total", "Extended info records deleted by edits or admin calls")
        .expect("register deletes_total")
});

pub static RECONCILE_RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_reconcile_runs_total", "Completed reconciliation passes")
        .expect("register reconcile_runs_total")
});

pub static RECONCILE_REMOVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_reconcile_removed_total", "Orphaned records removed by reconciliation")
        .expect("register reconcile_removed_total")
});

pub static RECONCILE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("extendedinfo_reconcile_failures_total", "Reconciliation passes that failed")
        .expect("register reconcile_failures_total")
});

pub static RECONCILE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "extendedinfo_reconcile_duration_seconds",
        "Reconciliation pass duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]
    )
    .expect("register reconcile_duration")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (axum::http::StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
