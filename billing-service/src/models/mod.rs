//! Domain models for billing-service.

mod billing_code;
mod billing_code_entry;
mod project;
mod task;
mod work_entry;

pub use billing_code::{BillingCode, RateContext, UnitType};
pub use billing_code_entry::BillingCodeEntry;
pub use project::{BillingType, Project, ProjectRevenue, UNKNOWN_PROJECT};
pub use task::{Task, TaskLocation, TaskStatus};
pub use work_entry::{
    CreateWorkEntry, InvoiceStatus, ListWorkEntriesFilter, UpdateWorkEntry, WorkEntry,
};
