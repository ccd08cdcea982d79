//! Services module for invoicing-service.

pub mod aggregator;
pub mod database;
pub mod invoicing;
pub mod metrics;
pub mod status;

pub use aggregator::{
    additional_subtotal, build_work_entry_line_items, compute_invoice_total,
    select_eligible_entries, sum_amounts, UNKNOWN_BILLING_CODE,
};
pub use database::InvoiceStore;
pub use invoicing::InvoicingService;
pub use metrics::{get_metrics, init_metrics};
pub use status::{next_status, BillingEvent};
