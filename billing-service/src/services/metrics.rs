//! Metrics module for billing-service.
//! Provides Prometheus metrics for repository access, rate lookups and the task cache.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Repository operation duration histogram
pub static STORE_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "billing_store_operation_duration_seconds",
            "In-memory repository operation duration"
        ),
        &["operation"]
    )
    .expect("Failed to register STORE_OPERATION_DURATION")
});

/// Rate lookups by outcome (found / missing)
pub static RATE_LOOKUPS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Task cache records skipped while loading
pub static TASK_CACHE_SKIPPED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Work entry operations counter
pub static WORK_ENTRY_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    RATE_LOOKUPS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_rate_lookups_total",
                "Billing code rate lookups by result"
            ),
            &["result"]
        )
        .expect("Failed to register RATE_LOOKUPS_TOTAL")
    });

    TASK_CACHE_SKIPPED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_task_cache_skipped_total",
                "Completed-task cache records skipped on load"
            ),
            &["reason"]
        )
        .expect("Failed to register TASK_CACHE_SKIPPED_TOTAL")
    });

    WORK_ENTRY_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_work_entry_operations_total",
                "Work entry operations by type"
            ),
            &["operation"]
        )
        .expect("Failed to register WORK_ENTRY_OPERATIONS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*STORE_OPERATION_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a rate lookup.
pub fn record_rate_lookup(result: &str) {
    if let Some(counter) = RATE_LOOKUPS_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
}

/// Record a skipped task cache record.
pub fn record_task_cache_skipped(reason: &str) {
    if let Some(counter) = TASK_CACHE_SKIPPED_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

/// Record a work entry operation.
pub fn record_work_entry_operation(operation: &str) {
    if let Some(counter) = WORK_ENTRY_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}
