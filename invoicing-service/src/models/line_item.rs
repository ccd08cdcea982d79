//! Line item models for invoicing-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

/// Manually added charge on an invoice (mobilization, permits, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalLineItem {
    #[validate(length(min = 1, message = "Line item description is required"))]
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl AdditionalLineItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity x unit_price`, rejected when it does not fit in a `Decimal`.
    pub fn amount(&self) -> Result<Decimal, AppError> {
        self.quantity.checked_mul(self.unit_price).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Amount for '{}' is too large",
                self.description
            ))
        })
    }

    /// Field checks, quantity > 0, a non-negative price and a representable amount.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.quantity <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Quantity for '{}' must be greater than 0",
                self.description
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unit price for '{}' must not be negative",
                self.description
            )));
        }
        self.amount()?;
        Ok(())
    }
}

/// A priced line on a submitted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    /// Source work entry, `None` for manually added items.
    pub work_entry_id: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

impl TryFrom<&AdditionalLineItem> for InvoiceLine {
    type Error = AppError;

    fn try_from(item: &AdditionalLineItem) -> Result<Self, Self::Error> {
        Ok(Self {
            work_entry_id: None,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            amount: item.amount()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_is_quantity_times_price() {
        let item = AdditionalLineItem::new("Traffic control", dec!(2), dec!(125.50));
        assert!(item.check().is_ok());
        assert_eq!(item.amount().unwrap(), dec!(251.00));

        let line = InvoiceLine::try_from(&item).unwrap();
        assert_eq!(line.work_entry_id, None);
        assert_eq!(line.amount, dec!(251.00));
    }

    #[test]
    fn oversized_amount_fails_check() {
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let item = AdditionalLineItem::new("Huge", huge, huge);

        assert!(item.check().unwrap_err().is_validation());
        assert!(InvoiceLine::try_from(&item).is_err());
    }

    #[test]
    fn rejects_zero_quantity_and_negative_price() {
        assert!(AdditionalLineItem::new("Permit", dec!(0), dec!(90))
            .check()
            .unwrap_err()
            .is_validation());
        assert!(AdditionalLineItem::new("Credit", dec!(1), dec!(-5))
            .check()
            .unwrap_err()
            .is_validation());
        assert!(AdditionalLineItem::new("", dec!(1), dec!(5))
            .check()
            .unwrap_err()
            .is_validation());
    }
}
