//! Test helper module for billing-service integration tests.
//!
//! Provides a seeded in-memory store shared by the test files.

#![allow(dead_code)]

use billing_service::models::{
    BillingCode, BillingType, CreateWorkEntry, Project, UnitType, WorkEntry,
};
use billing_service::services::{init_metrics, Database, ProjectRepository, WorkEntryRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Fixture ids
pub const STANDARD_PROJECT_ID: &str = "proj-fiber-north";
pub const CONTRACTOR_PROJECT_ID: &str = "proj-bore-south";
pub const TECH_ID: &str = "tm-alvarez";

pub fn billing_code(id: &str, description: &str, rate: Decimal) -> BillingCode {
    BillingCode {
        id: id.to_string(),
        code: id.to_string(),
        description: description.to_string(),
        rate_per_foot: rate,
        unit_type: UnitType::Foot,
    }
}

pub fn standard_project() -> Project {
    Project {
        id: STANDARD_PROJECT_ID.to_string(),
        name: "Fiber Ring North".to_string(),
        client: "Metro Telecom".to_string(),
        billing_type: BillingType::Unit,
        hourly_rate: None,
        service_name: Some("Underground placement".to_string()),
        use_contractor: false,
        contractor_hourly_rate: None,
        billing_codes: vec![
            billing_code("UND-1", "Underground conduit", dec!(2.50)),
            billing_code("AER-3", "Aerial strand", dec!(1.10)),
        ],
    }
}

pub fn contractor_project() -> Project {
    Project {
        id: CONTRACTOR_PROJECT_ID.to_string(),
        name: "Bore South".to_string(),
        client: "County Broadband".to_string(),
        billing_type: BillingType::Unit,
        hourly_rate: None,
        service_name: None,
        use_contractor: true,
        contractor_hourly_rate: Some(dec!(75)),
        billing_codes: vec![billing_code("BOR-2", "Directional bore", dec!(4.00))],
    }
}

/// Store with both fixture projects and no work entries.
pub fn seeded_database() -> Database {
    init_metrics();
    let db = Database::new();
    db.insert_project(standard_project()).unwrap();
    db.insert_project(contractor_project()).unwrap();
    db
}

pub fn record_work(
    db: &Database,
    project_id: &str,
    billing_code_id: &str,
    date: &str,
    feet: Decimal,
) -> WorkEntry {
    db.create_work_entry(&CreateWorkEntry {
        date: date.parse().unwrap(),
        project_id: project_id.to_string(),
        team_member_id: TECH_ID.to_string(),
        billing_code_id: billing_code_id.to_string(),
        feet_completed: feet,
    })
    .expect("Failed to record work entry")
}
