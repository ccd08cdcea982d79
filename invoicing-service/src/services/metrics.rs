//! Prometheus metrics for invoicing-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter_vec, CounterVec,
    HistogramVec, IntCounterVec, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Invoice submissions by result.
pub static INVOICES_SUBMITTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "invoicing_invoices_submitted_total",
        "Total number of invoice submissions by result",
        &["result"] // submitted, rejected, conflict, empty
    )
    .expect("Failed to register invoices_submitted_total")
});

/// Work entry status transitions.
pub static STATUS_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "invoicing_status_transitions_total",
        "Work entry invoice status transitions",
        &["from", "to"]
    )
    .expect("Failed to register status_transitions_total")
});

/// Invoiced amount by line kind.
pub static INVOICED_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoiced_amount_total",
        "Total invoiced amount by line kind",
        &["kind"] // work, additional
    )
    .expect("Failed to register invoiced_amount_total")
});

/// Invoice store operation duration histogram.
pub static STORE_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoicing_store_operation_duration_seconds",
        "Invoice store operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    )
    .expect("Failed to register store_operation_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&INVOICES_SUBMITTED_TOTAL);
    Lazy::force(&STATUS_TRANSITIONS_TOTAL);
    Lazy::force(&INVOICED_AMOUNT_TOTAL);
    Lazy::force(&STORE_OPERATION_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

pub fn record_submission(result: &str) {
    INVOICES_SUBMITTED_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_transitions(from: &str, to: &str, count: usize) {
    if count > 0 {
        STATUS_TRANSITIONS_TOTAL
            .with_label_values(&[from, to])
            .inc_by(count as u64);
    }
}

/// Add an invoiced amount. Negative or unrepresentable amounts are ignored.
pub fn record_invoiced_amount(kind: &str, amount: Decimal) {
    if let Some(value) = amount.to_f64().filter(|v| *v > 0.0) {
        INVOICED_AMOUNT_TOTAL.with_label_values(&[kind]).inc_by(value);
    }
}
