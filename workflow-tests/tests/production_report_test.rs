//! Completed tasks flowing through the cache into the production summary.

use std::fs;

use billing_service::services::{aggregate_by_month, DEFAULT_WINDOW_MONTHS};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use service_core::utils::FixedClock;
use workflow_tests::{WorkflowTestContext, CONTRACTOR_PROJECT_ID, PROJECT_ID};

fn context(dir: &tempfile::TempDir) -> WorkflowTestContext {
    WorkflowTestContext::new(dir.path(), FixedClock::at_date(2026, 10, 19).unwrap()).unwrap()
}

#[test]
fn completed_tasks_roll_into_monthly_production() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);

    let split = ctx
        .complete_task(
            "t-1",
            PROJECT_ID,
            &["UND-1", "AER-3"],
            dec!(300),
            Utc.with_ymd_and_hms(2026, 9, 5, 17, 30, 0).unwrap(),
        )
        .unwrap();
    assert_eq!(split.billing_code_entries.len(), 2);
    assert_eq!(split.billing_code_entries[0].quantity_estimate(), dec!(150.00));

    let bore = ctx
        .complete_task(
            "t-2",
            CONTRACTOR_PROJECT_ID,
            &["BOR-2"],
            dec!(100),
            Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap(),
        )
        .unwrap();
    assert_eq!(bore.billing_code_entries[0].rate_per_unit(), dec!(3.00));
    assert_eq!(bore.estimated_value(), dec!(300.00));

    // A year and a month ago: outside the window.
    ctx.complete_task(
        "t-3",
        PROJECT_ID,
        &["UND-1"],
        dec!(999),
        Utc.with_ymd_and_hms(2025, 10, 31, 12, 0, 0).unwrap(),
    )
    .unwrap();

    let tasks = ctx.cache.load();
    assert_eq!(tasks.len(), 3);

    let months = aggregate_by_month(&tasks, DEFAULT_WINDOW_MONTHS, &ctx.clock);
    assert_eq!(months.len(), 12);
    assert_eq!(months[0].month_label, "Nov 2025");
    assert_eq!(months[11].month_label, "Oct 2026");
    assert_eq!(months[10].units, dec!(300));
    assert_eq!(months[11].units, dec!(100));
    assert_eq!(months[11].task_count, 1);
    assert_eq!(months[11].cumulative_units, dec!(400));
}

#[test]
fn damaged_cache_records_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.complete_task(
        "t-1",
        PROJECT_ID,
        &["UND-1"],
        dec!(50),
        Utc.with_ymd_and_hms(2026, 10, 3, 8, 0, 0).unwrap(),
    )
    .unwrap();

    let raw = fs::read_to_string(ctx.cache.path()).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    doc.as_array_mut()
        .unwrap()
        .push(serde_json::json!({"id": "t-bad", "startDate": "yesterday"}));
    fs::write(ctx.cache.path(), doc.to_string()).unwrap();

    let tasks = ctx.cache.load();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "t-1");
}

#[test]
fn empty_history_gives_zero_filled_window() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);

    let months = aggregate_by_month(&ctx.cache.load(), DEFAULT_WINDOW_MONTHS, &ctx.clock);
    assert_eq!(months.len(), 12);
    assert!(months
        .iter()
        .all(|m| m.units == Decimal::ZERO && m.task_count == 0 && m.cumulative_units == Decimal::ZERO));
}
