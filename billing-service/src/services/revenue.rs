//! Revenue for work entries.
//!
//! Work-entry revenue always uses the base rate. The contractor percentage only
//! applies to task-level billing entries (see `rates::build_billing_entries`).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{BillingCode, Project, ProjectRevenue, WorkEntry};

/// `feet_completed x rate_per_foot`, or `None` when the code is unknown.
///
/// Full precision; callers round for display. Saturates at `Decimal::MAX`,
/// use [`checked_revenue`] where an amount is billed.
pub fn calculate_revenue(entry: &WorkEntry, codes: &[BillingCode]) -> Option<Decimal> {
    find_code(entry, codes).map(|code| entry.feet_completed.saturating_mul(code.rate_per_foot))
}

/// Like [`calculate_revenue`], but an amount too large for a `Decimal` is a
/// `BadRequest` instead of a saturated value.
pub fn checked_revenue(
    entry: &WorkEntry,
    codes: &[BillingCode],
) -> Result<Option<Decimal>, AppError> {
    let Some(code) = find_code(entry, codes) else {
        return Ok(None);
    };
    entry
        .feet_completed
        .checked_mul(code.rate_per_foot)
        .map(Some)
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Revenue for work entry '{}' is too large",
                entry.id
            ))
        })
}

fn find_code<'a>(entry: &WorkEntry, codes: &'a [BillingCode]) -> Option<&'a BillingCode> {
    codes.iter().find(|c| c.id == entry.billing_code_id)
}

/// Display default: an unknown code contributes 0.
pub fn calculate_revenue_or_zero(entry: &WorkEntry, codes: &[BillingCode]) -> Decimal {
    calculate_revenue(entry, codes).unwrap_or(Decimal::ZERO)
}

/// Total revenue over `entries`.
pub fn total_revenue<'a>(
    entries: impl IntoIterator<Item = &'a WorkEntry>,
    codes: &[BillingCode],
) -> Decimal {
    entries
        .into_iter()
        .map(|e| calculate_revenue_or_zero(e, codes))
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Revenue grouped by project, ordered by project id.
///
/// Each entry is priced with its own project's catalog; entries whose project
/// is unknown are grouped under "Unknown Project" and priced at 0.
pub fn revenue_by_project(entries: &[WorkEntry], projects: &[Project]) -> Vec<ProjectRevenue> {
    let mut grouped: BTreeMap<&str, ProjectRevenue> = BTreeMap::new();

    for entry in entries {
        let project = projects.iter().find(|p| p.id == entry.project_id);
        let revenue = project
            .map(|p| calculate_revenue_or_zero(entry, &p.billing_codes))
            .unwrap_or(Decimal::ZERO);

        let row = grouped
            .entry(entry.project_id.as_str())
            .or_insert_with(|| ProjectRevenue {
                project_id: entry.project_id.clone(),
                project_name: Project::display_name(project).to_string(),
                entry_count: 0,
                units: Decimal::ZERO,
                revenue: Decimal::ZERO,
            });
        row.entry_count += 1;
        row.units = row.units.saturating_add(entry.feet_completed);
        row.revenue = row.revenue.saturating_add(revenue);
    }

    grouped.into_values().collect()
}
