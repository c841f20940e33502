//! Prometheus metrics for cache occupancy and resolution timings.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_gauge_vec, HistogramVec, IntGaugeVec};

/// Number of entries in the workspace cache, per tier.
pub static CACHE_SIZE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "pomsolve_workspace_cache_size",
        "Number of entries in the workspace cache",
        &["layer"]
    )
    .unwrap()
});

/// Wall-clock time spent resolving one POM model.
pub static RESOLVE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pomsolve_resolve_model_seconds",
        "Time to resolve a POM model",
        &["group_id", "artifact_id"]
    )
    .unwrap()
});
