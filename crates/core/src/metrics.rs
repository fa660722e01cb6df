//! Prometheus metrics for core components.
//!
//! Covers the collector (runs, discovered repos), the resolver (load sources,
//! fallbacks) and the source browser (fetch outcomes, cache hits). The server
//! registers everything here into its registry and exposes `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Collector
// =============================================================================

/// Collection runs by result ("completed", "rate_limited", "failed").
pub static COLLECTOR_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chaindex_collector_runs_total", "Total collection runs"),
        &["result"],
    )
    .unwrap()
});

/// Repositories merged per run, by disposition.
pub static COLLECTOR_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chaindex_collector_records_total",
            "Records processed by collection runs",
        ),
        &["disposition"], // "added", "updated", "skipped"
    )
    .unwrap()
});

/// Search API requests by result.
pub static COLLECTOR_API_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chaindex_collector_api_requests_total",
            "Hosting API search requests",
        ),
        &["result"], // "ok", "rate_limited", "error"
    )
    .unwrap()
});

// =============================================================================
// Resolver
// =============================================================================

/// Catalog loads by serving source ("cache", "mirror", "bundled").
pub static RESOLVER_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chaindex_resolver_loads_total", "Catalog snapshot loads"),
        &["source"],
    )
    .unwrap()
});

/// Mirror failures downgraded to the bundled snapshot.
pub static RESOLVER_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chaindex_resolver_fallbacks_total",
        "Mirror reads that fell back to the bundled snapshot",
    )
    .unwrap()
});

// =============================================================================
// Source browser
// =============================================================================

/// Code fetches by outcome ("hit", "fetched", "no_code", "error").
pub static BROWSER_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chaindex_browser_fetches_total",
            "Repository code fetches by outcome",
        ),
        &["outcome"],
    )
    .unwrap()
});

/// Duration of full repository scans (cache misses only).
pub static BROWSER_SCAN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "chaindex_browser_scan_duration_seconds",
            "Duration of repository code scans",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &[],
    )
    .unwrap()
});

/// Register all core metrics into a registry. Safe to call once per registry.
pub fn register_all(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(COLLECTOR_RUNS.clone()))?;
    registry.register(Box::new(COLLECTOR_RECORDS.clone()))?;
    registry.register(Box::new(COLLECTOR_API_REQUESTS.clone()))?;
    registry.register(Box::new(RESOLVER_LOADS.clone()))?;
    registry.register(Box::new(RESOLVER_FALLBACKS.clone()))?;
    registry.register(Box::new(BROWSER_FETCHES.clone()))?;
    registry.register(Box::new(BROWSER_SCAN_DURATION.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_into_fresh_registry() {
        let registry = Registry::new();
        register_all(&registry).unwrap();

        RESOLVER_FALLBACKS.inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "chaindex_resolver_fallbacks_total"));
    }

    #[test]
    fn test_labelled_counters_accept_known_labels() {
        RESOLVER_LOADS.with_label_values(&["cache"]).inc();
        COLLECTOR_RUNS.with_label_values(&["completed"]).inc();
        BROWSER_FETCHES.with_label_values(&["no_code"]).inc();
    }
}
