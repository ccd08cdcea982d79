//! Work entry invoice status lifecycle.
//!
//! `not_invoiced -> invoiced -> paid`. There is no backward edge.

use billing_service::models::InvoiceStatus;
use service_core::error::AppError;

/// Something that happened to a work entry's billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEvent {
    /// The entry was included on a submitted invoice.
    Invoiced,
    /// Payment for the entry's invoice was recorded.
    PaymentRecorded,
}

impl BillingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingEvent::Invoiced => "invoiced",
            BillingEvent::PaymentRecorded => "payment_recorded",
        }
    }

    /// Status the event moves an entry into.
    pub fn target(&self) -> InvoiceStatus {
        match self {
            BillingEvent::Invoiced => InvoiceStatus::Invoiced,
            BillingEvent::PaymentRecorded => InvoiceStatus::Paid,
        }
    }
}

/// Apply `event` to an entry currently in `current`.
///
/// `Ok(Some(next))` advances, `Ok(None)` means the entry is already at or past
/// the event's target, and an error means the event is not allowed yet.
pub fn next_status(
    current: InvoiceStatus,
    event: BillingEvent,
) -> Result<Option<InvoiceStatus>, AppError> {
    match (current, event) {
        (InvoiceStatus::NotInvoiced, BillingEvent::Invoiced) => Ok(Some(InvoiceStatus::Invoiced)),
        (InvoiceStatus::Invoiced, BillingEvent::PaymentRecorded) => Ok(Some(InvoiceStatus::Paid)),
        (InvoiceStatus::NotInvoiced, BillingEvent::PaymentRecorded) => Err(AppError::BadRequest(
            anyhow::anyhow!("Cannot record payment for a work entry that has not been invoiced"),
        )),
        (InvoiceStatus::Invoiced | InvoiceStatus::Paid, BillingEvent::Invoiced)
        | (InvoiceStatus::Paid, BillingEvent::PaymentRecorded) => Ok(None),
    }
}
