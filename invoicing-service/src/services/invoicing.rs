//! Invoice submission and payment recording.
//!
//! Submission validates and prices everything up front, then moves the
//! selected work entries `not_invoiced -> invoiced` in one compare-and-swap
//! batch. Entries that were invoiced by someone else in the meantime are
//! skipped, so no entry ever lands on two invoices. If the invoice cannot be
//! stored afterwards the batch is reverted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use billing_service::models::{BillingCode, InvoiceStatus, WorkEntry};
use billing_service::services::{ProjectRepository, TransitionOutcome, WorkEntryRepository};
use service_core::error::AppError;
use service_core::utils::{Clock, SystemClock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    AdditionalLineItem, Invoice, InvoiceLine, InvoicePreview, InvoiceScope, SubmitInvoice,
};
use crate::services::aggregator::{
    additional_subtotal, build_work_entry_line_items, compute_invoice_total,
    select_eligible_entries, sum_amounts,
};
use crate::services::database::InvoiceStore;
use crate::services::metrics::{record_invoiced_amount, record_submission, record_transitions};
use crate::services::status::{next_status, BillingEvent};

type Catalogs = HashMap<String, Vec<BillingCode>>;

pub struct InvoicingService {
    work_entries: Arc<dyn WorkEntryRepository>,
    projects: Arc<dyn ProjectRepository>,
    invoices: Arc<InvoiceStore>,
    clock: Arc<dyn Clock>,
    // Serializes number check, status batch and invoice insert.
    submission: Mutex<()>,
}

impl InvoicingService {
    pub fn new(
        work_entries: Arc<dyn WorkEntryRepository>,
        projects: Arc<dyn ProjectRepository>,
        invoices: Arc<InvoiceStore>,
    ) -> Self {
        Self::with_clock(work_entries, projects, invoices, Arc::new(SystemClock))
    }

    pub fn with_clock(
        work_entries: Arc<dyn WorkEntryRepository>,
        projects: Arc<dyn ProjectRepository>,
        invoices: Arc<InvoiceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            work_entries,
            projects,
            invoices,
            clock,
            submission: Mutex::new(()),
        }
    }

    pub fn invoices(&self) -> &InvoiceStore {
        &self.invoices
    }

    /// Billing codes for every project referenced by `entries`.
    fn load_catalogs(&self, entries: &[WorkEntry]) -> Result<Catalogs, AppError> {
        let mut catalogs = Catalogs::new();
        for entry in entries {
            if !catalogs.contains_key(&entry.project_id) {
                let codes = self.projects.get_billing_codes_for_project(&entry.project_id)?;
                catalogs.insert(entry.project_id.clone(), codes);
            }
        }
        Ok(catalogs)
    }

    /// Entries in scope regardless of status, with the current stored state.
    fn entries_in_scope(&self, scope: &InvoiceScope) -> Result<Vec<WorkEntry>, AppError> {
        self.work_entries.list_work_entries(&scope.to_filter())
    }

    /// Live totals for the invoice dialog. Nothing is mutated.
    #[instrument(skip(self, selected_ids, additional_items), fields(project_id = ?scope.project_id))]
    pub fn preview(
        &self,
        scope: &InvoiceScope,
        selected_ids: &[String],
        additional_items: &[AdditionalLineItem],
    ) -> Result<InvoicePreview, AppError> {
        let entries = self.entries_in_scope(scope)?;
        let eligible = select_eligible_entries(
            &entries,
            scope.project_id.as_deref(),
            scope.start_date,
            scope.end_date,
        );
        let catalogs = self.load_catalogs(&eligible)?;

        let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
        let chosen: Vec<WorkEntry> = eligible
            .iter()
            .filter(|e| selected.contains(e.id.as_str()))
            .cloned()
            .collect();

        let mut line_items = price_entries(&chosen, &catalogs)?;
        for item in additional_items {
            line_items.push(InvoiceLine::try_from(item)?);
        }

        let mut subtotals = Vec::with_capacity(catalogs.len() + 1);
        for (project_id, codes) in &catalogs {
            let project_entries: Vec<WorkEntry> = eligible
                .iter()
                .filter(|e| &e.project_id == project_id)
                .cloned()
                .collect();
            subtotals.push(compute_invoice_total(selected_ids, &project_entries, codes, &[])?);
        }
        subtotals.push(additional_subtotal(additional_items)?);

        Ok(InvoicePreview {
            eligible_entries: eligible,
            line_items,
            total: sum_amounts(subtotals)?,
        })
    }

    fn check_submission(input: &SubmitInvoice) -> Result<(), AppError> {
        input.validate()?;
        for item in &input.additional_line_items {
            item.check()?;
        }
        additional_subtotal(&input.additional_line_items)?;
        if input.scope.start_date > input.scope.end_date {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Start date {} is after end date {}",
                input.scope.start_date,
                input.scope.end_date
            )));
        }
        if input.selected_entry_ids.is_empty() && input.additional_line_items.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Select at least one work entry or add a line item"
            )));
        }
        Ok(())
    }

    /// Submit an invoice and mark its work entries invoiced.
    #[instrument(skip(self, input), fields(selected = input.selected_entry_ids.len()))]
    pub fn submit_invoice(&self, input: SubmitInvoice) -> Result<Invoice, AppError> {
        let input = input.normalized();
        if let Err(e) = Self::check_submission(&input) {
            warn!(error = %e, "Invoice submission rejected");
            record_submission("rejected");
            return Err(e);
        }

        let _guard = self
            .submission
            .lock()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Submission lock poisoned")))?;

        if self.invoices.contains_number(&input.invoice_number)? {
            record_submission("conflict");
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                input.invoice_number
            )));
        }

        let in_scope = self.entries_in_scope(&input.scope)?;
        let in_scope_ids: HashSet<&str> = in_scope.iter().map(|e| e.id.as_str()).collect();
        let (candidate_ids, outside): (Vec<String>, Vec<String>) = input
            .selected_entry_ids
            .iter()
            .cloned()
            .partition(|id| in_scope_ids.contains(id.as_str()));
        if !outside.is_empty() {
            debug!(entry_ids = ?outside, "Skipping selected entries outside the invoice scope");
        }

        let catalogs = self.load_catalogs(&in_scope)?;

        // Price every entry that could still be invoiced before touching status.
        let wanted: HashSet<&str> = candidate_ids.iter().map(String::as_str).collect();
        let invoiceable: Vec<WorkEntry> = in_scope
            .iter()
            .filter(|e| e.invoice_status == InvoiceStatus::NotInvoiced)
            .filter(|e| wanted.contains(e.id.as_str()))
            .cloned()
            .collect();
        if invoiceable.is_empty() && input.additional_line_items.is_empty() {
            record_submission("empty");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "None of the selected work entries can be invoiced"
            )));
        }
        let priced = price_entries(&invoiceable, &catalogs).and_then(|lines| {
            let additional = additional_subtotal(&input.additional_line_items)?;
            sum_amounts(lines.iter().map(|l| l.amount).chain([additional]))
        });
        if let Err(e) = priced {
            warn!(error = %e, "Invoice submission rejected");
            record_submission("rejected");
            return Err(e);
        }

        let outcome = self.work_entries.transition_work_entries(
            &candidate_ids,
            InvoiceStatus::NotInvoiced,
            InvoiceStatus::Invoiced,
        )?;
        for (id, reason) in outcome.skipped() {
            debug!(entry_id = %id, reason = ?reason, "Selected entry not invoiced");
        }

        if outcome.applied().is_empty() && input.additional_line_items.is_empty() {
            record_submission("empty");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "None of the selected work entries can be invoiced"
            )));
        }

        let stored = self
            .assemble_invoice(&input, &outcome, &catalogs)
            .and_then(|invoice| self.invoices.insert_invoice(invoice));
        let invoice = match stored {
            Ok(invoice) => invoice,
            Err(e) => {
                self.revert_submission(&outcome, &e);
                record_submission("failed");
                return Err(e);
            }
        };

        record_transitions(
            InvoiceStatus::NotInvoiced.as_str(),
            InvoiceStatus::Invoiced.as_str(),
            outcome.applied().len(),
        );
        record_submission("submitted");
        record_invoiced_amount("work", invoice.work_subtotal);
        record_invoiced_amount("additional", invoice.additional_subtotal);

        info!(
            invoice_number = %invoice.invoice_number,
            entries = invoice.work_entry_ids.len(),
            skipped = outcome.skipped().len(),
            total = %invoice.total,
            "Invoice submitted"
        );

        Ok(invoice)
    }

    /// Build the invoice for the entries a batch actually moved.
    fn assemble_invoice(
        &self,
        input: &SubmitInvoice,
        outcome: &TransitionOutcome,
        catalogs: &Catalogs,
    ) -> Result<Invoice, AppError> {
        let mut line_items = price_entries(outcome.applied(), catalogs)?;
        let work_subtotal = sum_amounts(line_items.iter().map(|l| l.amount))?;
        let additional = additional_subtotal(&input.additional_line_items)?;
        for item in &input.additional_line_items {
            line_items.push(InvoiceLine::try_from(item)?);
        }

        Ok(Invoice {
            invoice_id: Uuid::new_v4().to_string(),
            invoice_number: input.invoice_number.clone(),
            client_name: input.client_name.clone(),
            scope: input.scope.clone(),
            work_entry_ids: outcome.applied_ids(),
            line_items,
            work_subtotal,
            additional_subtotal: additional,
            total: sum_amounts([work_subtotal, additional])?,
            notes: input.notes.clone(),
            created_utc: self.clock.now(),
        })
    }

    /// Put entries moved by a failed submission back to `not_invoiced`.
    fn revert_submission(&self, outcome: &TransitionOutcome, cause: &AppError) {
        match self.work_entries.revert_transition(outcome) {
            Ok(restored) => warn!(
                error = %cause,
                restored,
                "Invoice not stored, work entry statuses restored"
            ),
            Err(e) => error!(
                error = %e,
                cause = %cause,
                entry_ids = ?outcome.applied_ids(),
                "Invoice not stored and work entry statuses could not be restored"
            ),
        }
    }

    /// Record payment for one work entry.
    ///
    /// Already paid entries are returned unchanged. Entries that were never
    /// invoiced are rejected and left as they are.
    #[instrument(skip(self))]
    pub fn mark_paid(&self, entry_id: &str) -> Result<WorkEntry, AppError> {
        let entry = self
            .work_entries
            .get_work_entry(entry_id)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Work entry '{}' not found", entry_id)))?;

        let Some(next) = next_status(entry.invoice_status, BillingEvent::PaymentRecorded)? else {
            debug!(entry_id = %entry_id, "Work entry already paid");
            return Ok(entry);
        };

        let outcome = self.work_entries.transition_work_entries(
            &[entry.id.clone()],
            entry.invoice_status,
            next,
        )?;

        match outcome.into_applied().pop() {
            Some(paid) => {
                record_transitions(entry.invoice_status.as_str(), next.as_str(), 1);
                info!(entry_id = %entry_id, "Payment recorded");
                Ok(paid)
            }
            None => {
                // Lost a race: accept it if someone else already recorded payment.
                let current = self.work_entries.get_work_entry(entry_id)?.ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Work entry '{}' not found", entry_id))
                })?;
                if current.invoice_status == InvoiceStatus::Paid {
                    Ok(current)
                } else {
                    Err(AppError::Conflict(anyhow::anyhow!(
                        "Work entry '{}' changed while recording payment",
                        entry_id
                    )))
                }
            }
        }
    }

    /// Record payment for every work entry on an invoice.
    ///
    /// Returns the entries that moved to `paid`; entries already paid are
    /// skipped.
    #[instrument(skip(self))]
    pub fn mark_invoice_paid(&self, invoice_number: &str) -> Result<Vec<WorkEntry>, AppError> {
        let invoice = self
            .invoices
            .get_invoice_by_number(invoice_number)?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Invoice '{}' not found", invoice_number))
            })?;

        let outcome = self.work_entries.transition_work_entries(
            &invoice.work_entry_ids,
            InvoiceStatus::Invoiced,
            InvoiceStatus::Paid,
        )?;
        record_transitions(
            InvoiceStatus::Invoiced.as_str(),
            InvoiceStatus::Paid.as_str(),
            outcome.applied().len(),
        );

        info!(
            invoice_number = %invoice_number,
            paid = outcome.applied().len(),
            skipped = outcome.skipped().len(),
            "Invoice payment recorded"
        );

        Ok(outcome.into_applied())
    }
}

/// Price each entry with its own project's catalog, keeping entry order.
fn price_entries(
    entries: &[WorkEntry],
    catalogs: &Catalogs,
) -> Result<Vec<InvoiceLine>, AppError> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let codes = catalogs
            .get(&entry.project_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        lines.extend(build_work_entry_line_items(std::slice::from_ref(entry), codes)?);
    }
    Ok(lines)
}
