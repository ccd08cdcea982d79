//! Work entry model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Billing progress of a work entry. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    NotInvoiced,
    Invoiced,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::NotInvoiced => "not_invoiced",
            InvoiceStatus::Invoiced => "invoiced",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "invoiced" => InvoiceStatus::Invoiced,
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::NotInvoiced,
        }
    }

    /// Position in the lifecycle, used to compare progress.
    pub fn rank(&self) -> u8 {
        match self {
            InvoiceStatus::NotInvoiced => 0,
            InvoiceStatus::Invoiced => 1,
            InvoiceStatus::Paid => 2,
        }
    }

    /// Whether `next` is the single step after this status.
    pub fn can_advance_to(&self, next: InvoiceStatus) -> bool {
        next.rank() == self.rank() + 1
    }
}

/// Completed work by a team member against a billing code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    pub id: String,
    pub date: NaiveDate,
    pub project_id: String,
    pub team_member_id: String,
    pub billing_code_id: String,
    pub feet_completed: Decimal,
    #[serde(default)]
    pub invoice_status: InvoiceStatus,
}

/// Input for a technician's work-entry submission.
#[derive(Debug, Clone, Validate)]
pub struct CreateWorkEntry {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Project is required"))]
    pub project_id: String,
    #[validate(length(min = 1, message = "Team member is required"))]
    pub team_member_id: String,
    #[validate(length(min = 1, message = "Billing code is required"))]
    pub billing_code_id: String,
    pub feet_completed: Decimal,
}

/// Edit-dialog changes. Status is deliberately absent: it only moves through
/// invoicing.
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkEntry {
    pub date: Option<NaiveDate>,
    pub billing_code_id: Option<String>,
    pub feet_completed: Option<Decimal>,
}

/// Filter parameters for listing work entries. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ListWorkEntriesFilter {
    pub project_id: Option<String>,
    pub team_member_id: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListWorkEntriesFilter {
    pub fn matches(&self, entry: &WorkEntry) -> bool {
        self.project_id
            .as_deref()
            .map_or(true, |p| entry.project_id == p)
            && self
                .team_member_id
                .as_deref()
                .map_or(true, |m| entry.team_member_id == m)
            && self.status.map_or(true, |s| entry.invoice_status == s)
            && self.start_date.map_or(true, |d| entry.date >= d)
            && self.end_date.map_or(true, |d| entry.date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(date: &str, project: &str, status: InvoiceStatus) -> WorkEntry {
        WorkEntry {
            id: "we-1".to_string(),
            date: date.parse().unwrap(),
            project_id: project.to_string(),
            team_member_id: "tm-1".to_string(),
            billing_code_id: "UND-1".to_string(),
            feet_completed: dec!(10),
            invoice_status: status,
        }
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&InvoiceStatus::NotInvoiced).unwrap();
        assert_eq!(json, "\"not_invoiced\"");
        assert_eq!(InvoiceStatus::from_string("paid"), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_string("bogus"), InvoiceStatus::NotInvoiced);
    }

    #[test]
    fn status_advances_one_step_at_a_time() {
        use InvoiceStatus::*;
        assert!(NotInvoiced.can_advance_to(Invoiced));
        assert!(Invoiced.can_advance_to(Paid));

        assert!(!NotInvoiced.can_advance_to(Paid));
        for from in [NotInvoiced, Invoiced, Paid] {
            assert!(!from.can_advance_to(from));
            for to in [NotInvoiced, Invoiced, Paid] {
                if to.rank() < from.rank() {
                    assert!(!from.can_advance_to(to));
                }
            }
        }
    }

    #[test]
    fn missing_status_defaults_to_not_invoiced() {
        let json = r#"{
            "id": "we-9",
            "date": "2026-03-04",
            "projectId": "p-1",
            "teamMemberId": "tm-2",
            "billingCodeId": "UND-1",
            "feetCompleted": 42.5
        }"#;
        let entry: WorkEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.invoice_status, InvoiceStatus::NotInvoiced);
        assert_eq!(entry.feet_completed, dec!(42.5));
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let filter = ListWorkEntriesFilter {
            project_id: Some("p-1".to_string()),
            start_date: Some("2026-01-01".parse().unwrap()),
            end_date: Some("2026-01-31".parse().unwrap()),
            ..Default::default()
        };
        assert!(filter.matches(&entry("2026-01-01", "p-1", InvoiceStatus::NotInvoiced)));
        assert!(filter.matches(&entry("2026-01-31", "p-1", InvoiceStatus::Paid)));
        assert!(!filter.matches(&entry("2026-02-01", "p-1", InvoiceStatus::NotInvoiced)));
        assert!(!filter.matches(&entry("2026-01-15", "p-2", InvoiceStatus::NotInvoiced)));
    }

    #[test]
    fn create_requires_ids() {
        let input = CreateWorkEntry {
            date: "2026-01-01".parse().unwrap(),
            project_id: String::new(),
            team_member_id: "tm-1".to_string(),
            billing_code_id: "UND-1".to_string(),
            feet_completed: dec!(1),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("project_id"));
    }
}
