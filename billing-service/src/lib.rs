//! Billing engine for field-service work: rate resolution, work-entry revenue,
//! production summaries and the repositories the invoicing flow runs against.

pub mod config;
pub mod models;
pub mod services;
