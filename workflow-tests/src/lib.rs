//! Cross-crate workflow test support.
//!
//! Wires the billing repositories, the invoicing service and a completed-task
//! cache together the way a field application would, with a fixed clock so
//! production summaries are deterministic.

use std::path::Path;
use std::sync::{Arc, Once};

use billing_service::models::{
    BillingCode, BillingType, CreateWorkEntry, Project, Task, TaskStatus, UnitType, WorkEntry,
};
use billing_service::services::{
    build_billing_entries, CompletedTaskCache, Database, ProjectRepository, WorkEntryRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use invoicing_service::services::{InvoiceStore, InvoicingService};
use rust_decimal::Decimal;
use service_core::error::AppError;
use service_core::utils::FixedClock;

pub const PROJECT_ID: &str = "proj-fiber-north";
pub const CONTRACTOR_PROJECT_ID: &str = "proj-bore-south";
pub const TECH_ID: &str = "tm-nguyen";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn code(id: &str, description: &str, rate: Decimal) -> BillingCode {
    BillingCode {
        id: id.to_string(),
        code: id.to_string(),
        description: description.to_string(),
        rate_per_foot: rate,
        unit_type: UnitType::Foot,
    }
}

pub fn fiber_project() -> Project {
    Project {
        id: PROJECT_ID.to_string(),
        name: "Fiber Ring North".to_string(),
        client: "Metro Telecom".to_string(),
        billing_type: BillingType::Unit,
        hourly_rate: None,
        service_name: Some("Underground placement".to_string()),
        use_contractor: false,
        contractor_hourly_rate: None,
        billing_codes: vec![
            code("UND-1", "Underground conduit", Decimal::new(250, 2)),
            code("AER-3", "Aerial strand", Decimal::new(110, 2)),
        ],
    }
}

pub fn bore_project() -> Project {
    Project {
        id: CONTRACTOR_PROJECT_ID.to_string(),
        name: "Bore South".to_string(),
        client: "County Broadband".to_string(),
        billing_type: BillingType::Unit,
        hourly_rate: None,
        service_name: None,
        use_contractor: true,
        contractor_hourly_rate: Some(Decimal::from(75)),
        billing_codes: vec![code("BOR-2", "Directional bore", Decimal::new(400, 2))],
    }
}

/// Everything a workflow test touches.
pub struct WorkflowTestContext {
    pub db: Arc<Database>,
    pub invoicing: Arc<InvoicingService>,
    pub cache: CompletedTaskCache,
    pub clock: FixedClock,
}

impl WorkflowTestContext {
    /// Seeded store, invoicing service and a task cache under `cache_dir`.
    pub fn new(cache_dir: &Path, clock: FixedClock) -> Result<Self, AppError> {
        init_tracing();
        billing_service::services::init_metrics();
        invoicing_service::services::init_metrics();

        let db = Arc::new(Database::new());
        db.insert_project(fiber_project())?;
        db.insert_project(bore_project())?;
        Self::with_database(db, cache_dir, clock)
    }

    pub fn with_database(
        db: Arc<Database>,
        cache_dir: &Path,
        clock: FixedClock,
    ) -> Result<Self, AppError> {
        let invoicing = Arc::new(InvoicingService::with_clock(
            db.clone(),
            db.clone(),
            Arc::new(InvoiceStore::new()),
            Arc::new(clock),
        ));
        Ok(Self {
            db,
            invoicing,
            cache: CompletedTaskCache::new(cache_dir.join("completed_tasks.json")),
            clock,
        })
    }

    pub fn record_work(
        &self,
        project_id: &str,
        billing_code_id: &str,
        date: &str,
        feet: Decimal,
    ) -> Result<WorkEntry, AppError> {
        let parsed: NaiveDate = date
            .parse()
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid date {}: {}", date, e)))?;
        self.db.create_work_entry(&CreateWorkEntry {
            date: parsed,
            project_id: project_id.to_string(),
            team_member_id: TECH_ID.to_string(),
            billing_code_id: billing_code_id.to_string(),
            feet_completed: feet,
        })
    }

    /// Complete a task on `project_id` with `bulk` spread over `code_ids`,
    /// and add it to the completed-task cache.
    pub fn complete_task(
        &self,
        task_id: &str,
        project_id: &str,
        code_ids: &[&str],
        bulk: Decimal,
        finished: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        let project = self.db.get_project(project_id)?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Project '{}' not found", project_id))
        })?;
        let selected: Vec<String> = code_ids.iter().map(|c| c.to_string()).collect();
        let task = Task {
            id: task_id.to_string(),
            title: format!("Task {task_id}"),
            project_id: project_id.to_string(),
            status: TaskStatus::Completed,
            assigned_to: Some(TECH_ID.to_string()),
            start_date: finished,
            end_date: Some(finished),
            quantity_estimate: bulk,
            billing_code_entries: build_billing_entries(&project, &selected, bulk, false)?,
            location: None,
        };
        self.cache.append_completed(task.clone())?;
        Ok(task)
    }
}
