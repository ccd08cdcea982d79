//! Project model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BillingCode, RateContext};

/// Label shown when a project id cannot be resolved.
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// How a project is billed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillingType {
    Hourly,
    #[default]
    Unit,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::Hourly => "hourly",
            BillingType::Unit => "unit",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "hourly" => BillingType::Hourly,
            _ => BillingType::Unit,
        }
    }
}

/// Project owning a catalog of billing codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub billing_type: BillingType,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub use_contractor: bool,
    /// Contractor share of the base rate, as a percentage (0-100).
    #[serde(default)]
    pub contractor_hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub billing_codes: Vec<BillingCode>,
}

impl Project {
    pub fn billing_code(&self, billing_code_id: &str) -> Option<&BillingCode> {
        self.billing_codes.iter().find(|c| c.id == billing_code_id)
    }

    /// Context used when composing task-level billing entries.
    pub fn rate_context(&self) -> RateContext {
        if self.use_contractor {
            RateContext::Contractor {
                percentage: self.contractor_hourly_rate,
            }
        } else {
            RateContext::Standard
        }
    }

    pub fn display_name(project: Option<&Project>) -> &str {
        project.map(|p| p.name.as_str()).unwrap_or(UNKNOWN_PROJECT)
    }
}

/// Revenue rolled up for one project (dashboard card).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRevenue {
    pub project_id: String,
    pub project_name: String,
    pub entry_count: usize,
    pub units: Decimal,
    pub revenue: Decimal,
}
