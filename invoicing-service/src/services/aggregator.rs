//! Invoice aggregation: which work entries can be billed and what they total.
//!
//! Amounts are summed with checked arithmetic; a total that does not fit in a
//! `Decimal` is a `BadRequest`.

use std::collections::HashSet;

use billing_service::models::{BillingCode, InvoiceStatus, WorkEntry};
use billing_service::services::checked_revenue;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{AdditionalLineItem, InvoiceLine};

pub const UNKNOWN_BILLING_CODE: &str = "Unknown Billing Code";

/// Entries that may go on an invoice for the given project and period.
///
/// Dates are inclusive and `project_id: None` matches every project. Only
/// `not_invoiced` entries are ever returned. Input order is preserved.
pub fn select_eligible_entries(
    entries: &[WorkEntry],
    project_id: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WorkEntry> {
    entries
        .iter()
        .filter(|e| e.invoice_status == InvoiceStatus::NotInvoiced)
        .filter(|e| project_id.map_or(true, |p| e.project_id == p))
        .filter(|e| e.date >= start && e.date <= end)
        .cloned()
        .collect()
}

/// Revenue of the selected entries plus every additional line item.
///
/// Ids that match no entry contribute nothing, as do entries whose billing
/// code is unknown. An empty selection with no items totals 0.
pub fn compute_invoice_total(
    selected_ids: &[String],
    entries: &[WorkEntry],
    codes: &[BillingCode],
    additional_items: &[AdditionalLineItem],
) -> Result<Decimal, AppError> {
    let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
    let work = entries
        .iter()
        .filter(|e| selected.contains(e.id.as_str()))
        .map(|e| checked_revenue(e, codes).map(|r| r.unwrap_or(Decimal::ZERO)));
    let items = additional_items.iter().map(AdditionalLineItem::amount);

    checked_total(work.chain(items))
}

pub fn additional_subtotal(items: &[AdditionalLineItem]) -> Result<Decimal, AppError> {
    checked_total(items.iter().map(AdditionalLineItem::amount))
}

/// Sum of already priced amounts.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AppError> {
    checked_total(amounts.into_iter().map(Ok))
}

fn checked_total(
    amounts: impl IntoIterator<Item = Result<Decimal, AppError>>,
) -> Result<Decimal, AppError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount?)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invoice total is too large")))
    })
}

/// One invoice line per entry, priced at the code's base rate.
pub fn build_work_entry_line_items(
    entries: &[WorkEntry],
    codes: &[BillingCode],
) -> Result<Vec<InvoiceLine>, AppError> {
    entries
        .iter()
        .map(|entry| {
            let code = codes.iter().find(|c| c.id == entry.billing_code_id);
            Ok(InvoiceLine {
                work_entry_id: Some(entry.id.clone()),
                description: code
                    .map(BillingCode::display_name)
                    .unwrap_or_else(|| UNKNOWN_BILLING_CODE.to_string()),
                quantity: entry.feet_completed,
                unit_price: code.map_or(Decimal::ZERO, |c| c.rate_per_foot),
                amount: checked_revenue(entry, codes)?.unwrap_or(Decimal::ZERO),
            })
        })
        .collect()
}
