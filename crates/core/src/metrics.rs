//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Searches (fallback path taken, result counts)
//! - Persistence (failed saves)
//! - External providers (requests, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Metrics
// =============================================================================

/// Searches total by the path that answered.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinematch_searches_total", "Total searches"),
        &["path"], // "combined", "streaming", "pattern"
    )
    .unwrap()
});

/// Movies returned per search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinematch_search_results",
            "Number of movies returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0]),
        &["path"],
    )
    .unwrap()
});

/// Movies that could not be persisted.
pub static PERSIST_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinematch_persist_failures_total",
        "Total movies that failed to persist",
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider requests by outcome.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinematch_provider_requests_total",
            "Total provider requests",
        ),
        &["provider", "status"], // status: "success", "timeout", "error"
    )
    .unwrap()
});

/// Provider call duration in seconds.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinematch_provider_duration_seconds",
            "Duration of provider calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["provider"],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(PERSIST_FAILURES.clone()),
        // Providers
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        SEARCHES_TOTAL.with_label_values(&["combined"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "cinematch_searches_total"));
    }
}
