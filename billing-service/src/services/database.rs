//! In-memory repositories for billing-service.
//!
//! Projects, billing codes and work entries are held behind a single
//! `RwLock`. Callers depend on the [`ProjectRepository`] and
//! [`WorkEntryRepository`] traits so services can be built against any store.

use crate::models::{
    BillingCode, CreateWorkEntry, InvoiceStatus, ListWorkEntriesFilter, Project, UpdateWorkEntry,
    WorkEntry,
};
use crate::services::metrics::{record_work_entry_operation, STORE_OPERATION_DURATION};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Read access to projects and their billing-code catalogs.
pub trait ProjectRepository: Send + Sync {
    fn get_project(&self, project_id: &str) -> Result<Option<Project>, AppError>;

    fn list_projects(&self) -> Result<Vec<Project>, AppError>;

    /// Billing codes owned by a project. Unknown projects yield an empty list.
    fn get_billing_codes_for_project(&self, project_id: &str)
        -> Result<Vec<BillingCode>, AppError>;

    fn insert_project(&self, project: Project) -> Result<Project, AppError>;

    /// Add a billing code to a project, replacing one with the same id.
    fn upsert_billing_code(
        &self,
        project_id: &str,
        code: BillingCode,
    ) -> Result<Option<Project>, AppError>;
}

/// Work entry storage.
pub trait WorkEntryRepository: Send + Sync {
    /// Entries matching `filter`, ordered by date then id.
    fn list_work_entries(&self, filter: &ListWorkEntriesFilter)
        -> Result<Vec<WorkEntry>, AppError>;

    fn get_work_entry(&self, entry_id: &str) -> Result<Option<WorkEntry>, AppError>;

    /// Record a technician submission. New entries start `not_invoiced`.
    fn create_work_entry(&self, input: &CreateWorkEntry) -> Result<WorkEntry, AppError>;

    /// Insert a fully formed entry (imports, fixtures).
    fn insert_work_entry(&self, entry: WorkEntry) -> Result<WorkEntry, AppError>;

    /// Apply an edit. Returns `None` when the entry does not exist.
    fn update_work_entry(
        &self,
        entry_id: &str,
        input: &UpdateWorkEntry,
    ) -> Result<Option<WorkEntry>, AppError>;

    fn delete_work_entry(&self, entry_id: &str) -> Result<bool, AppError>;

    /// Move every entry in `entry_ids` from `from` to `to` in one batch.
    ///
    /// Each entry is compared-and-swapped under a single write lock: entries
    /// that are missing or not currently in `from` are skipped, the rest are
    /// applied together. `from -> to` must be a single forward step.
    fn transition_work_entries(
        &self,
        entry_ids: &[String],
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<TransitionOutcome, AppError>;

    /// Undo a batch returned by [`transition_work_entries`].
    ///
    /// Only entries in the outcome's applied set that are still in its target
    /// status move back. Returns how many were restored.
    ///
    /// [`transition_work_entries`]: WorkEntryRepository::transition_work_entries
    fn revert_transition(&self, outcome: &TransitionOutcome) -> Result<usize, AppError>;
}

/// Why an entry was left out of a batch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    StatusMismatch(InvoiceStatus),
    Duplicate,
}

/// Result of a batch status transition. Only a repository can issue one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionOutcome {
    from: InvoiceStatus,
    to: InvoiceStatus,
    applied: Vec<WorkEntry>,
    skipped: Vec<(String, SkipReason)>,
}

impl TransitionOutcome {
    fn new(from: InvoiceStatus, to: InvoiceStatus) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    /// Entries after the transition, in request order.
    pub fn applied(&self) -> &[WorkEntry] {
        &self.applied
    }

    pub fn skipped(&self) -> &[(String, SkipReason)] {
        &self.skipped
    }

    pub fn applied_ids(&self) -> Vec<String> {
        self.applied.iter().map(|e| e.id.clone()).collect()
    }

    pub fn into_applied(self) -> Vec<WorkEntry> {
        self.applied
    }
}

/// Serializable contents of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub work_entries: Vec<WorkEntry>,
}

/// In-memory store implementing both repositories.
#[derive(Debug, Default)]
pub struct Database {
    state: RwLock<Snapshot>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        info!(
            projects = snapshot.projects.len(),
            work_entries = snapshot.work_entries.len(),
            "Store loaded from snapshot"
        );
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Load a JSON snapshot file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::StorageError(anyhow::anyhow!(
                "Failed to read snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            AppError::StorageError(anyhow::anyhow!("Failed to parse snapshot: {}", e))
        })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Store lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Store lock poisoned")))
    }
}

fn validate_feet(feet: Decimal) -> Result<(), AppError> {
    if feet <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be greater than 0, got {}",
            feet
        )));
    }
    Ok(())
}

fn ensure_code_on_project(
    state: &Snapshot,
    project_id: &str,
    billing_code_id: &str,
) -> Result<(), AppError> {
    let project = state
        .projects
        .iter()
        .find(|p| p.id == project_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Project '{}' not found", project_id)))?;
    if project.billing_code(billing_code_id).is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Billing code '{}' does not belong to project '{}'",
            billing_code_id,
            project_id
        )));
    }
    Ok(())
}

impl ProjectRepository for Database {
    #[instrument(skip(self))]
    fn get_project(&self, project_id: &str) -> Result<Option<Project>, AppError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_project"])
            .start_timer();

        let project = self.read()?.projects.iter().find(|p| p.id == project_id).cloned();

        timer.observe_duration();

        Ok(project)
    }

    #[instrument(skip(self))]
    fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        Ok(self.read()?.projects.clone())
    }

    #[instrument(skip(self))]
    fn get_billing_codes_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<BillingCode>, AppError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_billing_codes_for_project"])
            .start_timer();

        let codes = self
            .read()?
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.billing_codes.clone())
            .unwrap_or_default();

        timer.observe_duration();

        Ok(codes)
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    fn insert_project(&self, project: Project) -> Result<Project, AppError> {
        if project.name.trim().is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Project name is required")));
        }

        let mut state = self.write()?;
        if state.projects.iter().any(|p| p.id == project.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Project '{}' already exists",
                project.id
            )));
        }
        state.projects.push(project.clone());

        info!(project_id = %project.id, name = %project.name, "Project created");

        Ok(project)
    }

    #[instrument(skip(self, code), fields(billing_code_id = %code.id))]
    fn upsert_billing_code(
        &self,
        project_id: &str,
        code: BillingCode,
    ) -> Result<Option<Project>, AppError> {
        if code.rate_per_foot < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Rate must not be negative, got {}",
                code.rate_per_foot
            )));
        }

        let mut state = self.write()?;
        let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(None);
        };

        match project.billing_codes.iter_mut().find(|c| c.id == code.id) {
            Some(existing) => *existing = code,
            None => project.billing_codes.push(code),
        }

        info!(project_id = %project_id, "Billing code saved");

        Ok(Some(project.clone()))
    }
}

impl WorkEntryRepository for Database {
    #[instrument(skip(self, filter))]
    fn list_work_entries(
        &self,
        filter: &ListWorkEntriesFilter,
    ) -> Result<Vec<WorkEntry>, AppError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["list_work_entries"])
            .start_timer();

        let mut entries: Vec<WorkEntry> = self
            .read()?
            .work_entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        timer.observe_duration();

        Ok(entries)
    }

    #[instrument(skip(self))]
    fn get_work_entry(&self, entry_id: &str) -> Result<Option<WorkEntry>, AppError> {
        Ok(self
            .read()?
            .work_entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned())
    }

    #[instrument(skip(self, input), fields(project_id = %input.project_id))]
    fn create_work_entry(&self, input: &CreateWorkEntry) -> Result<WorkEntry, AppError> {
        input.validate()?;
        validate_feet(input.feet_completed)?;

        let mut state = self.write()?;
        ensure_code_on_project(&state, &input.project_id, &input.billing_code_id)?;

        let entry = WorkEntry {
            id: Uuid::new_v4().to_string(),
            date: input.date,
            project_id: input.project_id.clone(),
            team_member_id: input.team_member_id.clone(),
            billing_code_id: input.billing_code_id.clone(),
            feet_completed: input.feet_completed,
            invoice_status: InvoiceStatus::NotInvoiced,
        };
        state.work_entries.push(entry.clone());

        record_work_entry_operation("create");
        info!(entry_id = %entry.id, feet = %entry.feet_completed, "Work entry recorded");

        Ok(entry)
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    fn insert_work_entry(&self, entry: WorkEntry) -> Result<WorkEntry, AppError> {
        let mut state = self.write()?;
        if state.work_entries.iter().any(|e| e.id == entry.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Work entry '{}' already exists",
                entry.id
            )));
        }
        state.work_entries.push(entry.clone());

        record_work_entry_operation("insert");

        Ok(entry)
    }

    #[instrument(skip(self, input))]
    fn update_work_entry(
        &self,
        entry_id: &str,
        input: &UpdateWorkEntry,
    ) -> Result<Option<WorkEntry>, AppError> {
        if let Some(feet) = input.feet_completed {
            validate_feet(feet)?;
        }

        let mut state = self.write()?;
        let Some(idx) = state.work_entries.iter().position(|e| e.id == entry_id) else {
            return Ok(None);
        };

        if let Some(code_id) = input.billing_code_id.as_deref() {
            let project_id = state.work_entries[idx].project_id.clone();
            ensure_code_on_project(&state, &project_id, code_id)?;
        }

        let entry = &mut state.work_entries[idx];
        if let Some(date) = input.date {
            entry.date = date;
        }
        if let Some(code_id) = &input.billing_code_id {
            entry.billing_code_id = code_id.clone();
        }
        if let Some(feet) = input.feet_completed {
            entry.feet_completed = feet;
        }
        let updated = entry.clone();

        record_work_entry_operation("update");
        info!(entry_id = %updated.id, "Work entry updated");

        Ok(Some(updated))
    }

    #[instrument(skip(self))]
    fn delete_work_entry(&self, entry_id: &str) -> Result<bool, AppError> {
        let mut state = self.write()?;
        let before = state.work_entries.len();
        state.work_entries.retain(|e| e.id != entry_id);
        let deleted = state.work_entries.len() != before;

        if deleted {
            record_work_entry_operation("delete");
            info!(entry_id = %entry_id, "Work entry deleted");
        }

        Ok(deleted)
    }

    #[instrument(skip(self, entry_ids), fields(count = entry_ids.len(), from = from.as_str(), to = to.as_str()))]
    fn transition_work_entries(
        &self,
        entry_ids: &[String],
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<TransitionOutcome, AppError> {
        if !from.can_advance_to(to) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Work entries cannot move from {} to {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["transition_work_entries"])
            .start_timer();

        let mut state = self.write()?;
        let mut outcome = TransitionOutcome::new(from, to);
        let mut seen = HashSet::new();

        for id in entry_ids {
            if !seen.insert(id.as_str()) {
                outcome.skipped.push((id.clone(), SkipReason::Duplicate));
                continue;
            }
            match state.work_entries.iter_mut().find(|e| &e.id == id) {
                Some(entry) if entry.invoice_status == from => {
                    entry.invoice_status = to;
                    outcome.applied.push(entry.clone());
                }
                Some(entry) => {
                    debug!(entry_id = %id, status = entry.invoice_status.as_str(), "Skipping entry in unexpected status");
                    outcome
                        .skipped
                        .push((id.clone(), SkipReason::StatusMismatch(entry.invoice_status)));
                }
                None => {
                    debug!(entry_id = %id, "Skipping missing entry");
                    outcome.skipped.push((id.clone(), SkipReason::NotFound));
                }
            }
        }
        drop(state);

        timer.observe_duration();

        info!(
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "Work entry status batch applied"
        );

        Ok(outcome)
    }

    #[instrument(skip(self, outcome), fields(count = outcome.applied.len(), to = outcome.from.as_str()))]
    fn revert_transition(&self, outcome: &TransitionOutcome) -> Result<usize, AppError> {
        if outcome.applied.is_empty() {
            return Ok(0);
        }

        let mut state = self.write()?;
        let mut restored = 0;
        for applied in &outcome.applied {
            if let Some(entry) = state
                .work_entries
                .iter_mut()
                .find(|e| e.id == applied.id && e.invoice_status == outcome.to)
            {
                entry.invoice_status = outcome.from;
                restored += 1;
            }
        }
        drop(state);

        record_work_entry_operation("revert");
        warn!(restored, "Work entry status batch reverted");

        Ok(restored)
    }
}
