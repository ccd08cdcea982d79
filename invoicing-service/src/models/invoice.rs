//! Invoice model for invoicing-service.

use billing_service::models::{ListWorkEntriesFilter, WorkEntry};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AdditionalLineItem, InvoiceLine};

/// Which work an invoice may cover. Dates are inclusive; `project_id: None`
/// spans all projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceScope {
    pub project_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl InvoiceScope {
    pub fn new(project_id: Option<&str>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            project_id: project_id.map(str::to_string),
            start_date,
            end_date,
        }
    }

    /// Project and date-range part of the scope as a repository filter.
    pub fn to_filter(&self) -> ListWorkEntriesFilter {
        ListWorkEntriesFilter {
            project_id: self.project_id.clone(),
            start_date: Some(self.start_date),
            end_date: Some(self.end_date),
            ..Default::default()
        }
    }
}

/// Invoice dialog submission.
#[derive(Debug, Clone, Validate)]
pub struct SubmitInvoice {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    pub scope: InvoiceScope,
    pub selected_entry_ids: Vec<String>,
    pub additional_line_items: Vec<AdditionalLineItem>,
    pub notes: Option<String>,
}

impl SubmitInvoice {
    /// Trim free-text fields so whitespace-only input counts as empty.
    pub fn normalized(mut self) -> Self {
        self.invoice_number = self.invoice_number.trim().to_string();
        self.client_name = self.client_name.trim().to_string();
        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        for item in &mut self.additional_line_items {
            item.description = item.description.trim().to_string();
        }
        self
    }
}

/// A submitted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub scope: InvoiceScope,
    /// Work entries moved to `invoiced` by this submission.
    pub work_entry_ids: Vec<String>,
    pub line_items: Vec<InvoiceLine>,
    pub work_subtotal: Decimal,
    pub additional_subtotal: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Live preview shown while the invoice dialog is open.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoicePreview {
    pub eligible_entries: Vec<WorkEntry>,
    pub line_items: Vec<InvoiceLine>,
    pub total: Decimal,
}
