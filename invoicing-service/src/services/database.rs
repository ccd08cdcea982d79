//! In-memory invoice store for invoicing-service.

use crate::models::Invoice;
use crate::services::metrics::STORE_OPERATION_DURATION;
use service_core::error::AppError;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, instrument};

/// Submitted invoices, unique by invoice number.
#[derive(Debug, Default)]
pub struct InvoiceStore {
    invoices: RwLock<Vec<Invoice>>,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Invoice>>, AppError> {
        self.invoices
            .read()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Invoice store lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Invoice>>, AppError> {
        self.invoices
            .write()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Invoice store lock poisoned")))
    }

    /// Store a new invoice.
    #[instrument(skip(self, invoice), fields(invoice_number = %invoice.invoice_number))]
    pub fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, AppError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let mut invoices = self.write()?;
        if invoices
            .iter()
            .any(|i| i.invoice_number == invoice.invoice_number)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                invoice.invoice_number
            )));
        }
        invoices.push(invoice.clone());
        drop(invoices);

        timer.observe_duration();

        info!(invoice_id = %invoice.invoice_id, total = %invoice.total, "Invoice stored");

        Ok(invoice)
    }

    pub fn contains_number(&self, invoice_number: &str) -> Result<bool, AppError> {
        Ok(self
            .read()?
            .iter()
            .any(|i| i.invoice_number == invoice_number))
    }

    #[instrument(skip(self))]
    pub fn get_invoice_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>, AppError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_invoice_by_number"])
            .start_timer();

        let invoice = self
            .read()?
            .iter()
            .find(|i| i.invoice_number == invoice_number)
            .cloned();

        timer.observe_duration();

        Ok(invoice)
    }

    /// Invoices in submission order, optionally limited to one project.
    #[instrument(skip(self))]
    pub fn list_invoices(&self, project_id: Option<&str>) -> Result<Vec<Invoice>, AppError> {
        Ok(self
            .read()?
            .iter()
            .filter(|i| project_id.map_or(true, |p| i.scope.project_id.as_deref() == Some(p)))
            .cloned()
            .collect())
    }
}
