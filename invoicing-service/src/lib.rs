//! Invoicing for field-service work entries: eligibility, totals, and the
//! `not_invoiced -> invoiced -> paid` lifecycle.

pub mod models;
pub mod services;
