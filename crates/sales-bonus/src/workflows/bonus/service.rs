use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::cache::{cache_key, ComputationCache};
use super::domain::{BonusStatus, EmployeeId, OrderEvaluationRecord, Remark, SocialPerformanceRecord};
use super::hr::{ExternalHrClient, HrStoreError};
use super::repository::{BonusComputation, RecordsStore, RepositoryError, StatusPatch};
use super::scoring::{BonusPools, ComputationOutcome, ScoringEngine};

const MAX_REMARK_CHARS: usize = 2000;
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

/// Service composing the scoring engine, computation cache, records store,
/// and external HR client into the bonus approval workflow.
pub struct BonusWorkflowService<R, H, C> {
    store: Arc<R>,
    hr: Arc<H>,
    cache: Arc<C>,
    engine: ScoringEngine,
    cache_ttl: Duration,
}

impl<R, H, C> BonusWorkflowService<R, H, C>
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    pub fn new(
        store: Arc<R>,
        hr: Arc<H>,
        cache: Arc<C>,
        pools: BonusPools,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            hr,
            cache,
            engine: ScoringEngine::new(pools),
            cache_ttl,
        }
    }

    /// Recompute totals from the current record sets and upsert the
    /// computation with status `COMPUTED`.
    ///
    /// Legal from any state: re-running while approvals are underway is the
    /// deliberate re-open-for-correction escape hatch and resets the status,
    /// discarding forward progress. Timestamps of states already passed are
    /// left as they were.
    pub fn compute(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        actor: &str,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        let social = self.store.social_records(employee_id, year)?;
        let orders = self.store.order_records(employee_id, year)?;

        let outcome = self.cached_outcome(&social, &orders);

        let mut computation = self
            .store
            .fetch_computation(employee_id, year)?
            .unwrap_or_else(|| BonusComputation::draft(employee_id.clone(), year));

        computation.social_total_eur = outcome.social_total_eur;
        computation.orders_total_eur = outcome.orders_total_eur;
        computation.total_bonus_eur = outcome.total_bonus_eur;
        computation.status = BonusStatus::Computed;
        computation.computed_at = Some(Utc::now());
        computation.computed_by = Some(actor.to_string());
        computation.details = Some(outcome);

        let stored = self.store.upsert_computation(computation)?;
        info!(
            employee_id = %employee_id.as_str(),
            year,
            total_bonus_eur = stored.total_bonus_eur,
            "bonus computed"
        );
        Ok(stored)
    }

    pub fn get(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;
        self.store
            .fetch_computation(employee_id, year)?
            .ok_or(BonusServiceError::NotFound)
    }

    pub fn history(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<BonusComputation>, BonusServiceError> {
        if employee_id.as_str().trim().is_empty() {
            return Err(BonusServiceError::Validation(
                "employee_id must not be empty".to_string(),
            ));
        }
        Ok(self.store.history(employee_id)?)
    }

    /// CEO approval: legal only from `COMPUTED`.
    pub fn approve_ceo(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        actor: &str,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        let approved = self.store.advance(
            employee_id,
            year,
            &[BonusStatus::Computed],
            StatusPatch::CeoApproved {
                actor: actor.to_string(),
                at: Utc::now(),
            },
        )?;

        info!(employee_id = %employee_id.as_str(), year, actor, "ceo approved bonus");
        Ok(approved)
    }

    /// HR approval followed by the external store. The approval itself is
    /// legal only from `CEO_APPROVED`; a record already at `HR_APPROVED`
    /// (earlier store attempt failed) retries only the store step. A failed
    /// push leaves the record at `HR_APPROVED` and surfaces the upstream
    /// error, with no rollback.
    pub fn approve_hr_and_store(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        actor: &str,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        let current = self
            .store
            .fetch_computation(employee_id, year)?
            .ok_or(BonusServiceError::NotFound)?;

        let approved = match current.status {
            BonusStatus::CeoApproved => {
                let approved = self.store.advance(
                    employee_id,
                    year,
                    &[BonusStatus::CeoApproved],
                    StatusPatch::HrApproved {
                        actor: actor.to_string(),
                        at: Utc::now(),
                    },
                )?;
                info!(employee_id = %employee_id.as_str(), year, actor, "hr approved bonus");
                approved
            }
            // Store retry: do not re-run the approval.
            BonusStatus::HrApproved => current,
            actual => {
                return Err(BonusServiceError::Conflict {
                    expected: vec![BonusStatus::CeoApproved],
                    actual,
                })
            }
        };

        if let Err(err) = self
            .hr
            .store_total_bonus(employee_id, year, approved.total_bonus_eur)
        {
            warn!(
                employee_id = %employee_id.as_str(),
                year,
                error = %err,
                "orangehrm store failed; record stays HR_APPROVED"
            );
            return Err(BonusServiceError::Upstream(err));
        }

        let stored = self.store.advance(
            employee_id,
            year,
            &[BonusStatus::HrApproved],
            StatusPatch::StoredInOrangeHrm { at: Utc::now() },
        )?;

        info!(employee_id = %employee_id.as_str(), year, "bonus stored in orangehrm");
        Ok(stored)
    }

    /// Release to the salesman; tolerant of a failed external store, so legal
    /// from `HR_APPROVED` as well as `STORED_IN_ORANGEHRM`.
    pub fn release(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        let released = self.store.advance(
            employee_id,
            year,
            &[BonusStatus::HrApproved, BonusStatus::StoredInOrangeHrm],
            StatusPatch::ReleasedToSalesman { at: Utc::now() },
        )?;

        info!(employee_id = %employee_id.as_str(), year, "bonus released to salesman");
        Ok(released)
    }

    /// Terminal confirmation by the owning employee. The acting identity is
    /// checked before any state transition, so a mismatch never disturbs the
    /// record.
    pub fn confirm(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        acting_employee_id: &EmployeeId,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        if acting_employee_id != employee_id {
            return Err(BonusServiceError::Forbidden(format!(
                "only employee {} may confirm this bonus",
                employee_id.as_str()
            )));
        }

        let confirmed = self.store.advance(
            employee_id,
            year,
            &[BonusStatus::ReleasedToSalesman],
            StatusPatch::SalesmanConfirmed { at: Utc::now() },
        )?;

        info!(employee_id = %employee_id.as_str(), year, "bonus confirmed by salesman");
        Ok(confirmed)
    }

    /// Append a remark without touching the status. Legal from any state once
    /// the computation exists.
    pub fn add_remark(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        actor: &str,
        role: &str,
        text: &str,
    ) -> Result<BonusComputation, BonusServiceError> {
        validate_key(employee_id, year)?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(BonusServiceError::Validation(
                "remark text must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_REMARK_CHARS {
            return Err(BonusServiceError::Validation(format!(
                "remark text exceeds {MAX_REMARK_CHARS} characters"
            )));
        }

        let remark = Remark {
            author: actor.to_string(),
            role: role.to_string(),
            text: trimmed.to_string(),
            created_at: Utc::now(),
        };

        Ok(self.store.append_remark(employee_id, year, remark)?)
    }

    /// Totals lookup with transparent memoization. Any cache trouble falls
    /// through to direct computation; population afterward is best-effort.
    fn cached_outcome(
        &self,
        social: &[SocialPerformanceRecord],
        orders: &[OrderEvaluationRecord],
    ) -> ComputationOutcome {
        let key = match cache_key(social, orders) {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, "cache key unavailable; computing directly");
                return self.engine.compute(social, orders);
            }
        };

        match self.cache.get(&key) {
            Ok(Some(outcome)) => return outcome,
            Ok(None) => {}
            Err(err) => warn!(error = %err, "cache read failed; computing directly"),
        }

        let outcome = self.engine.compute(social, orders);
        if let Err(err) = self.cache.set(&key, &outcome, self.cache_ttl) {
            warn!(error = %err, "cache write failed; result not memoized");
        }
        outcome
    }
}

fn validate_key(employee_id: &EmployeeId, year: i32) -> Result<(), BonusServiceError> {
    if employee_id.as_str().trim().is_empty() {
        return Err(BonusServiceError::Validation(
            "employee_id must not be empty".to_string(),
        ));
    }
    if !YEAR_RANGE.contains(&year) {
        return Err(BonusServiceError::Validation(format!(
            "year {year} outside supported range {}..={}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(())
}

/// Error taxonomy exposed to callers. Local failures (validation, not-found,
/// conflict, forbidden) are never retried automatically; upstream failures
/// are retryable by re-invoking the same action.
#[derive(Debug, thiserror::Error)]
pub enum BonusServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("bonus computation not found; compute first")]
    NotFound,
    #[error(
        "invalid status: expected {}, got {}",
        super::repository::expected_label(expected),
        actual.label()
    )]
    Conflict {
        expected: Vec<BonusStatus>,
        actual: BonusStatus,
    },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Upstream(#[from] HrStoreError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for BonusServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::StatusConflict { expected, actual } => {
                Self::Conflict { expected, actual }
            }
            other => Self::Repository(other),
        }
    }
}
