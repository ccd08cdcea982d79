//! Task-level billing line.
//!
//! `rate_per_unit` is stored for display but always derived from the billing
//! code and the percentage. The fields are private so every mutation goes
//! through a setter that calls [`BillingCodeEntry::recompute_rate`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use super::{BillingCode, RateContext};
use crate::services::rates::resolve_rate_or_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingCodeEntry {
    billing_code_id: String,
    percentage: Decimal,
    rate_per_unit: Decimal,
    quantity_estimate: Decimal,
    #[serde(default)]
    hide_rate_from_team_member: bool,
}

impl BillingCodeEntry {
    /// Build an entry paying `percentage` of the code's base rate.
    pub fn new(
        code: &BillingCode,
        percentage: Decimal,
        quantity_estimate: Decimal,
        hide_rate_from_team_member: bool,
    ) -> Result<Self, AppError> {
        validate_percentage(percentage)?;
        validate_quantity(quantity_estimate)?;

        let mut entry = Self {
            billing_code_id: code.id.clone(),
            percentage,
            rate_per_unit: Decimal::ZERO,
            quantity_estimate,
            hide_rate_from_team_member,
        };
        entry.recompute_rate(Some(code));
        Ok(entry)
    }

    pub fn billing_code_id(&self) -> &str {
        &self.billing_code_id
    }

    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    pub fn rate_per_unit(&self) -> Decimal {
        self.rate_per_unit
    }

    pub fn quantity_estimate(&self) -> Decimal {
        self.quantity_estimate
    }

    pub fn hide_rate_from_team_member(&self) -> bool {
        self.hide_rate_from_team_member
    }

    /// Recalculate `rate_per_unit` from `code`. A missing code yields 0.
    pub fn recompute_rate(&mut self, code: Option<&BillingCode>) {
        let code = code.filter(|c| c.id == self.billing_code_id);
        self.rate_per_unit = resolve_rate_or_default(
            code,
            RateContext::Contractor {
                percentage: Some(self.percentage),
            },
        );
    }

    pub fn set_billing_code(&mut self, code: &BillingCode) {
        self.billing_code_id = code.id.clone();
        self.recompute_rate(Some(code));
    }

    /// `code` must be the entry's current billing code.
    pub fn set_percentage(&mut self, percentage: Decimal, code: &BillingCode) -> Result<(), AppError> {
        validate_percentage(percentage)?;
        if code.id != self.billing_code_id {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Billing code '{}' does not match entry code '{}'",
                code.id,
                self.billing_code_id
            )));
        }
        self.percentage = percentage;
        self.recompute_rate(Some(code));
        Ok(())
    }

    pub fn set_quantity_estimate(&mut self, quantity_estimate: Decimal) -> Result<(), AppError> {
        validate_quantity(quantity_estimate)?;
        self.quantity_estimate = quantity_estimate;
        Ok(())
    }
}

fn validate_percentage(percentage: Decimal) -> Result<(), AppError> {
    if percentage < Decimal::ONE || percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Percentage must be between 1 and 100, got {}",
            percentage
        )));
    }
    Ok(())
}

fn validate_quantity(quantity: Decimal) -> Result<(), AppError> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be greater than 0, got {}",
            quantity
        )));
    }
    Ok(())
}
