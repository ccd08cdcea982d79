//! Monthly production summary for dashboards.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::utils::Clock;

use crate::models::Task;

/// Default number of months shown on the production chart.
pub const DEFAULT_WINDOW_MONTHS: u32 = 12;

/// One month of completed production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProduction {
    pub month_label: String,
    pub units: Decimal,
    pub task_count: u32,
    pub cumulative_units: Decimal,
}

/// Bucket completed tasks by the month of their `end_date`.
///
/// Always returns exactly `window_months` rows ending at the clock's current
/// month, oldest first, with empty months zero-filled. Tasks without an end
/// date or outside the window are ignored.
pub fn aggregate_by_month(
    completed_tasks: &[Task],
    window_months: u32,
    clock: &dyn Clock,
) -> Vec<MonthlyProduction> {
    let current = first_of_month(clock.today());

    let starts: Vec<NaiveDate> = (0..window_months)
        .rev()
        .filter_map(|offset| current.checked_sub_months(Months::new(offset)))
        .collect();

    let mut buckets: Vec<MonthlyProduction> = starts
        .iter()
        .map(|start| MonthlyProduction {
            month_label: start.format("%b %Y").to_string(),
            units: Decimal::ZERO,
            task_count: 0,
            cumulative_units: Decimal::ZERO,
        })
        .collect();

    for task in completed_tasks {
        let Some(end) = task.end_date else {
            continue;
        };
        let month = first_of_month(end.date_naive());
        if let Some(idx) = starts.iter().position(|s| *s == month) {
            buckets[idx].units = buckets[idx].units.saturating_add(task.quantity_estimate);
            buckets[idx].task_count += 1;
        }
    }

    let mut running = Decimal::ZERO;
    for bucket in &mut buckets {
        running = running.saturating_add(bucket.units);
        bucket.cumulative_units = running;
    }

    buckets
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
