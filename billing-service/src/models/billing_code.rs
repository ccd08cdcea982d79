//! Billing code model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit a billing code is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[default]
    Foot,
    Meter,
    Each,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Foot => "foot",
            UnitType::Meter => "meter",
            UnitType::Each => "each",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "meter" => UnitType::Meter,
            "each" => UnitType::Each,
            _ => UnitType::Foot,
        }
    }
}

/// Catalog entry defining a unit of billable work and its base rate.
///
/// `rate_per_foot` is the non-contractor unit rate whatever `unit_type` says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingCode {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub rate_per_foot: Decimal,
    #[serde(default)]
    pub unit_type: UnitType,
}

impl BillingCode {
    /// `"CODE - description"`, or just the code when there is no description.
    pub fn display_name(&self) -> String {
        if self.description.trim().is_empty() {
            self.code.clone()
        } else {
            format!("{} - {}", self.code, self.description)
        }
    }
}

/// Who performs the work, which decides how the base rate is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateContext {
    /// Internal crew: the base rate applies unchanged.
    #[default]
    Standard,
    /// External contractor paid a percentage of the base rate.
    /// `None` means 100%.
    Contractor { percentage: Option<Decimal> },
}
