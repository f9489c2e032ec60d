use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    BonusStatus, EmployeeId, OrderEvaluationRecord, Remark, SocialPerformanceRecord,
};
use super::scoring::ComputationOutcome;

/// Persisted bonus computation for one (employee, year) pair. Upserted by
/// compute, advanced by the approval transitions, never deleted: the
/// timestamp/actor pairs and remarks form the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusComputation {
    pub employee_id: EmployeeId,
    pub year: i32,

    pub social_total_eur: f64,
    pub orders_total_eur: f64,
    pub total_bonus_eur: f64,

    pub status: BonusStatus,

    pub remarks: Vec<Remark>,

    pub computed_at: Option<DateTime<Utc>>,
    pub computed_by: Option<String>,
    pub ceo_approved_at: Option<DateTime<Utc>>,
    pub ceo_approved_by: Option<String>,
    pub hr_approved_at: Option<DateTime<Utc>>,
    pub hr_approved_by: Option<String>,
    pub stored_in_orange_hrm_at: Option<DateTime<Utc>>,
    pub released_to_salesman_at: Option<DateTime<Utc>>,
    pub salesman_confirmed_at: Option<DateTime<Utc>>,

    /// Snapshot of the per-record breakdowns behind the current totals.
    pub details: Option<ComputationOutcome>,
}

impl BonusComputation {
    pub fn draft(employee_id: EmployeeId, year: i32) -> Self {
        Self {
            employee_id,
            year,
            social_total_eur: 0.0,
            orders_total_eur: 0.0,
            total_bonus_eur: 0.0,
            status: BonusStatus::Draft,
            remarks: Vec::new(),
            computed_at: None,
            computed_by: None,
            ceo_approved_at: None,
            ceo_approved_by: None,
            hr_approved_at: None,
            hr_approved_by: None,
            stored_in_orange_hrm_at: None,
            released_to_salesman_at: None,
            salesman_confirmed_at: None,
            details: None,
        }
    }

    /// Apply a guarded transition's effect. The status precondition has
    /// already been checked by the store's compare-and-swap; this only
    /// records the new state.
    pub fn apply(&mut self, patch: &StatusPatch) {
        self.status = patch.target();
        match patch {
            StatusPatch::CeoApproved { actor, at } => {
                self.ceo_approved_at = Some(*at);
                self.ceo_approved_by = Some(actor.clone());
            }
            StatusPatch::HrApproved { actor, at } => {
                self.hr_approved_at = Some(*at);
                self.hr_approved_by = Some(actor.clone());
            }
            StatusPatch::StoredInOrangeHrm { at } => {
                self.stored_in_orange_hrm_at = Some(*at);
            }
            StatusPatch::ReleasedToSalesman { at } => {
                self.released_to_salesman_at = Some(*at);
            }
            StatusPatch::SalesmanConfirmed { at } => {
                self.salesman_confirmed_at = Some(*at);
            }
        }
    }
}

/// Effect of one guarded forward transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPatch {
    CeoApproved { actor: String, at: DateTime<Utc> },
    HrApproved { actor: String, at: DateTime<Utc> },
    StoredInOrangeHrm { at: DateTime<Utc> },
    ReleasedToSalesman { at: DateTime<Utc> },
    SalesmanConfirmed { at: DateTime<Utc> },
}

impl StatusPatch {
    pub const fn target(&self) -> BonusStatus {
        match self {
            StatusPatch::CeoApproved { .. } => BonusStatus::CeoApproved,
            StatusPatch::HrApproved { .. } => BonusStatus::HrApproved,
            StatusPatch::StoredInOrangeHrm { .. } => BonusStatus::StoredInOrangeHrm,
            StatusPatch::ReleasedToSalesman { .. } => BonusStatus::ReleasedToSalesman,
            StatusPatch::SalesmanConfirmed { .. } => BonusStatus::SalesmanConfirmed,
        }
    }
}

/// Storage abstraction over the evaluation records and persisted
/// computations. Implementations must make [`RecordsStore::advance`] atomic
/// per (employee, year): the expected-status check and the mutation happen
/// under one conditional update, so two concurrent approvals cannot both
/// succeed from the same prior state.
pub trait RecordsStore: Send + Sync {
    fn social_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<SocialPerformanceRecord>, RepositoryError>;

    fn order_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<OrderEvaluationRecord>, RepositoryError>;

    fn fetch_computation(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Option<BonusComputation>, RepositoryError>;

    /// All computations for one employee, newest year first.
    fn history(&self, employee_id: &EmployeeId) -> Result<Vec<BonusComputation>, RepositoryError>;

    /// Unconditional upsert keyed by (employee, year); used by compute.
    fn upsert_computation(
        &self,
        computation: BonusComputation,
    ) -> Result<BonusComputation, RepositoryError>;

    /// Compare-and-swap transition: apply `patch` only when the current
    /// status is one of `expected`, otherwise fail with
    /// [`RepositoryError::StatusConflict`].
    fn advance(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        expected: &[BonusStatus],
        patch: StatusPatch,
    ) -> Result<BonusComputation, RepositoryError>;

    fn append_remark(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        remark: Remark,
    ) -> Result<BonusComputation, RepositoryError>;
}

pub(crate) fn expected_label(expected: &[BonusStatus]) -> String {
    expected
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("bonus computation not found")]
    NotFound,
    #[error("invalid status: expected {}, got {}", expected_label(expected), actual.label())]
    StatusConflict {
        expected: Vec<BonusStatus>,
        actual: BonusStatus,
    },
    #[error("records store unavailable: {0}")]
    Unavailable(String),
}
