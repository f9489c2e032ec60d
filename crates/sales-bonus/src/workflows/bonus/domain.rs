use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for sales employees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Qualitative per-criterion evaluation of an employee for one year.
/// Unique per (employee_id, year, criterion_key); created and mutated by HR,
/// with the derived bonus re-cached on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPerformanceRecord {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub criterion_key: String,
    #[serde(default)]
    pub criterion_name: String,
    pub target_value: f64,
    pub actual_value: f64,
    /// Raw weight in [0, 1]; normalized across the full record set when
    /// totals are computed, never rewritten in place.
    pub weight: f64,
    #[serde(default = "default_rating")]
    pub supervisor_rating: u8,
    #[serde(default = "default_rating")]
    pub peer_rating: u8,
    /// Derived, cached on the record for audit.
    #[serde(default)]
    pub computed_bonus_eur: f64,
    #[serde(default)]
    pub remark: String,
}

impl SocialPerformanceRecord {
    /// Reject malformed input before any computation touches it.
    pub fn validate(&self) -> Result<(), String> {
        if self.employee_id.as_str().trim().is_empty() {
            return Err("employee_id must not be empty".to_string());
        }
        if self.criterion_key.trim().is_empty() {
            return Err("criterion_key must not be empty".to_string());
        }
        if self.target_value < 0.0 {
            return Err("target_value must be >= 0".to_string());
        }
        if self.actual_value < 0.0 {
            return Err("actual_value must be >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(format!("weight {} outside [0, 1]", self.weight));
        }
        for (name, rating) in [
            ("supervisor_rating", self.supervisor_rating),
            ("peer_rating", self.peer_rating),
        ] {
            if !(1..=5).contains(&rating) {
                return Err(format!("{name} {rating} outside [1, 5]"));
            }
        }
        Ok(())
    }
}

/// Quantitative evaluation of one sales order's contribution to the bonus.
/// Unique per (employee_id, year, order_id); created by HR or upserted from
/// the CRM sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvaluationRecord {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub order_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub client_name: String,
    /// 1 = best client, 5 = worst.
    #[serde(default = "default_ranking")]
    pub client_ranking: u8,
    #[serde(default = "default_closing_probability")]
    pub closing_probability: f64,
    #[serde(default = "default_items_count")]
    pub items_count: u32,
    #[serde(default)]
    pub revenue_eur: f64,
    #[serde(default)]
    pub computed_bonus_eur: f64,
    #[serde(default)]
    pub remark: String,
}

impl OrderEvaluationRecord {
    pub fn validate(&self) -> Result<(), String> {
        if self.employee_id.as_str().trim().is_empty() {
            return Err("employee_id must not be empty".to_string());
        }
        if self.order_id.trim().is_empty() {
            return Err("order_id must not be empty".to_string());
        }
        if !(1..=5).contains(&self.client_ranking) {
            return Err(format!(
                "client_ranking {} outside [1, 5]",
                self.client_ranking
            ));
        }
        if !(0.0..=1.0).contains(&self.closing_probability) {
            return Err(format!(
                "closing_probability {} outside [0, 1]",
                self.closing_probability
            ));
        }
        if self.revenue_eur < 0.0 {
            return Err("revenue_eur must be >= 0".to_string());
        }
        Ok(())
    }
}

fn default_rating() -> u8 {
    5
}

fn default_ranking() -> u8 {
    3
}

fn default_closing_probability() -> f64 {
    0.5
}

fn default_items_count() -> u32 {
    1
}

/// Annotation appended to a bonus computation; never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remark {
    pub author: String,
    pub role: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Approval pipeline states in strict forward order. `Computed` is the only
/// re-entrant state: re-running the computation resets a record here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "COMPUTED")]
    Computed,
    #[serde(rename = "CEO_APPROVED")]
    CeoApproved,
    #[serde(rename = "HR_APPROVED")]
    HrApproved,
    #[serde(rename = "STORED_IN_ORANGEHRM")]
    StoredInOrangeHrm,
    #[serde(rename = "RELEASED_TO_SALESMAN")]
    ReleasedToSalesman,
    #[serde(rename = "SALESMAN_CONFIRMED")]
    SalesmanConfirmed,
}

impl BonusStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BonusStatus::Draft => "DRAFT",
            BonusStatus::Computed => "COMPUTED",
            BonusStatus::CeoApproved => "CEO_APPROVED",
            BonusStatus::HrApproved => "HR_APPROVED",
            BonusStatus::StoredInOrangeHrm => "STORED_IN_ORANGEHRM",
            BonusStatus::ReleasedToSalesman => "RELEASED_TO_SALESMAN",
            BonusStatus::SalesmanConfirmed => "SALESMAN_CONFIRMED",
        }
    }
}

impl std::fmt::Display for BonusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
