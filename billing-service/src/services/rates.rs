//! Rate resolution and task-level billing breakdowns.

use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use tracing::instrument;

use crate::models::{BillingCode, BillingCodeEntry, Project, RateContext};
use crate::services::metrics::record_rate_lookup;

/// Effective per-unit rate for `code` in `context`.
///
/// Contractor work pays `percentage` of the base rate, defaulting to 100%.
/// The percentage is not range-checked here.
pub fn resolve_rate(code: &BillingCode, context: RateContext) -> Decimal {
    match context {
        RateContext::Standard => code.rate_per_foot,
        RateContext::Contractor { percentage } => {
            let percentage = percentage.unwrap_or(Decimal::ONE_HUNDRED);
            code.rate_per_foot.saturating_mul(percentage) / Decimal::ONE_HUNDRED
        }
    }
}

/// Look up `billing_code_id` in `codes` and resolve its rate.
pub fn find_rate(
    codes: &[BillingCode],
    billing_code_id: &str,
    context: RateContext,
) -> Result<Decimal, AppError> {
    match codes.iter().find(|c| c.id == billing_code_id) {
        Some(code) => {
            record_rate_lookup("found");
            Ok(resolve_rate(code, context))
        }
        None => {
            record_rate_lookup("missing");
            Err(AppError::NotFound(anyhow::anyhow!(
                "Billing code '{}' not found",
                billing_code_id
            )))
        }
    }
}

/// Display-safe rate: an unresolved code reads as 0.
pub fn resolve_rate_or_default(code: Option<&BillingCode>, context: RateContext) -> Decimal {
    code.map(|c| resolve_rate(c, context))
        .unwrap_or(Decimal::ZERO)
}

/// Round to cents, half away from zero (matches how amounts are displayed).
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Divide `bulk` evenly over `parts`, each share rounded to cents.
///
/// Rounding residue is not redistributed: `100 / 3` yields three `33.33`.
pub fn split_bulk_quantity(bulk: Decimal, parts: usize) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }
    let share = round_to_cents(bulk / Decimal::from(parts));
    vec![share; parts]
}

/// Compose a task's billing breakdown from a bulk quantity spread over the
/// selected codes of `project`.
///
/// Contractor projects use the project's contractor percentage; everything
/// else bills at 100%.
#[instrument(skip(project, selected_code_ids), fields(project_id = %project.id, codes = selected_code_ids.len()))]
pub fn build_billing_entries(
    project: &Project,
    selected_code_ids: &[String],
    bulk_quantity: Decimal,
    hide_rate_from_team_member: bool,
) -> Result<Vec<BillingCodeEntry>, AppError> {
    if selected_code_ids.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Select at least one billing code"
        )));
    }
    if bulk_quantity <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be greater than 0, got {}",
            bulk_quantity
        )));
    }

    let percentage = match project.rate_context() {
        RateContext::Contractor { percentage } => percentage.unwrap_or(Decimal::ONE_HUNDRED),
        RateContext::Standard => Decimal::ONE_HUNDRED,
    };

    let shares = split_bulk_quantity(bulk_quantity, selected_code_ids.len());
    selected_code_ids
        .iter()
        .zip(shares)
        .map(|(code_id, share)| {
            let code = project.billing_code(code_id).ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Billing code '{}' not found on project '{}'",
                    code_id,
                    project.id
                ))
            })?;
            BillingCodeEntry::new(code, percentage, share, hide_rate_from_team_member)
        })
        .collect()
}
