//! Domain models for invoicing-service.

mod invoice;
mod line_item;

pub use invoice::{Invoice, InvoicePreview, InvoiceScope, SubmitInvoice};
pub use line_item::{AdditionalLineItem, InvoiceLine};
