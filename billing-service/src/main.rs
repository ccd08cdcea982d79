//! Billing report entry point.
//!
//! Loads the project/work-entry snapshot and the completed-task cache, then
//! logs revenue per project, unbilled revenue, and the monthly production
//! summary.

use billing_service::config::BillingConfig;
use billing_service::models::{InvoiceStatus, ListWorkEntriesFilter};
use billing_service::services::{
    aggregate_by_month, init_metrics, revenue_by_project, round_to_cents, CompletedTaskCache,
    Database, ProjectRepository, WorkEntryRepository,
};
use rust_decimal::Decimal;
use service_core::observability::init_tracing;
use service_core::utils::SystemClock;

fn main() -> std::io::Result<()> {
    // Load configuration
    let config = BillingConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(&config.service_name, &config.log_level, config.common.log_json);
    init_metrics();

    tracing::info!(
        version = %config.service_version,
        snapshot = %config.snapshot_path.display(),
        task_cache = %config.task_cache_path.display(),
        window_months = config.production_window_months,
        "Starting billing report"
    );

    let db = if config.snapshot_path.exists() {
        Database::load_snapshot(&config.snapshot_path).map_err(|e| {
            tracing::error!(error = %e, "Failed to load snapshot");
            std::io::Error::other(format!("Snapshot error: {}", e))
        })?
    } else {
        tracing::warn!("Snapshot not found, reporting on an empty store");
        Database::new()
    };

    let report_error = |e: service_core::error::AppError| {
        tracing::error!(error = %e, "Failed to build report");
        std::io::Error::other(e.to_string())
    };

    let projects = db.list_projects().map_err(report_error)?;
    let entries = db
        .list_work_entries(&ListWorkEntriesFilter::default())
        .map_err(report_error)?;

    for row in revenue_by_project(&entries, &projects) {
        tracing::info!(
            project = %row.project_name,
            entries = row.entry_count,
            units = %row.units,
            revenue = %round_to_cents(row.revenue),
            "Project revenue"
        );
    }

    let unbilled: Vec<_> = entries
        .iter()
        .filter(|e| e.invoice_status == InvoiceStatus::NotInvoiced)
        .cloned()
        .collect();
    let unbilled_revenue: Decimal = revenue_by_project(&unbilled, &projects)
        .iter()
        .map(|r| r.revenue)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    tracing::info!(
        entries = unbilled.len(),
        revenue = %round_to_cents(unbilled_revenue),
        "Unbilled work"
    );

    let cache = CompletedTaskCache::new(&config.task_cache_path);
    let completed: Vec<_> = cache.load().into_iter().filter(|t| t.is_completed()).collect();
    for month in aggregate_by_month(&completed, config.production_window_months, &SystemClock) {
        tracing::info!(
            month = %month.month_label,
            units = %month.units,
            tasks = month.task_count,
            cumulative = %month.cumulative_units,
            "Monthly production"
        );
    }

    tracing::info!("Billing report complete");
    Ok(())
}
