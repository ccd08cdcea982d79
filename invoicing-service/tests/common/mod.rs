//! Test helper module for invoicing-service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use billing_service::models::{
    BillingCode, BillingType, CreateWorkEntry, Project, UnitType, WorkEntry,
};
use billing_service::services::{Database, ProjectRepository, WorkEntryRepository};
use invoicing_service::models::{InvoiceScope, SubmitInvoice};
use invoicing_service::services::{init_metrics, InvoiceStore, InvoicingService};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const NORTH_PROJECT_ID: &str = "proj-fiber-north";
pub const EAST_PROJECT_ID: &str = "proj-fiber-east";
pub const TECH_ID: &str = "tm-okafor";

fn project(id: &str, name: &str, und_rate: Decimal) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        client: "Metro Telecom".to_string(),
        billing_type: BillingType::Unit,
        hourly_rate: None,
        service_name: None,
        use_contractor: false,
        contractor_hourly_rate: None,
        // Same code id on both projects, priced differently.
        billing_codes: vec![BillingCode {
            id: "UND-1".to_string(),
            code: "UND-1".to_string(),
            description: "Underground conduit".to_string(),
            rate_per_foot: und_rate,
            unit_type: UnitType::Foot,
        }],
    }
}

pub struct TestContext {
    pub db: Arc<Database>,
    pub service: Arc<InvoicingService>,
}

impl TestContext {
    pub fn new() -> Self {
        init_metrics();
        let db = Arc::new(Database::new());
        db.insert_project(project(NORTH_PROJECT_ID, "Fiber Ring North", dec!(2.50)))
            .unwrap();
        db.insert_project(project(EAST_PROJECT_ID, "Fiber Ring East", dec!(3.00)))
            .unwrap();
        let service = Arc::new(InvoicingService::new(
            db.clone(),
            db.clone(),
            Arc::new(InvoiceStore::new()),
        ));
        Self { db, service }
    }

    pub fn record(&self, project_id: &str, date: &str, feet: Decimal) -> WorkEntry {
        self.db
            .create_work_entry(&CreateWorkEntry {
                date: date.parse().unwrap(),
                project_id: project_id.to_string(),
                team_member_id: TECH_ID.to_string(),
                billing_code_id: "UND-1".to_string(),
                feet_completed: feet,
            })
            .expect("Failed to record work entry")
    }

    pub fn entry(&self, entry_id: &str) -> WorkEntry {
        self.db
            .get_work_entry(entry_id)
            .unwrap()
            .expect("Work entry missing")
    }
}

pub fn scope(project_id: Option<&str>, start: &str, end: &str) -> InvoiceScope {
    InvoiceScope::new(project_id, start.parse().unwrap(), end.parse().unwrap())
}

pub fn submission(number: &str, scope: InvoiceScope, ids: &[&WorkEntry]) -> SubmitInvoice {
    SubmitInvoice {
        invoice_number: number.to_string(),
        client_name: "Metro Telecom".to_string(),
        scope,
        selected_entry_ids: ids.iter().map(|e| e.id.clone()).collect(),
        additional_line_items: Vec::new(),
        notes: Some("Net 30".to_string()),
    }
}
