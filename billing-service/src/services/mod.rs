//! Services module for billing-service.

pub mod database;
pub mod metrics;
pub mod production;
pub mod rates;
pub mod revenue;
pub mod task_cache;

pub use database::{
    Database, ProjectRepository, SkipReason, Snapshot, TransitionOutcome, WorkEntryRepository,
};
pub use metrics::{
    get_metrics, init_metrics, record_rate_lookup, record_task_cache_skipped,
    record_work_entry_operation,
};
pub use production::{aggregate_by_month, MonthlyProduction, DEFAULT_WINDOW_MONTHS};
pub use rates::{
    build_billing_entries, find_rate, resolve_rate, resolve_rate_or_default, round_to_cents,
    split_bulk_quantity,
};
pub use revenue::{
    calculate_revenue, calculate_revenue_or_zero, checked_revenue, revenue_by_project,
    total_revenue,
};
pub use task_cache::CompletedTaskCache;
