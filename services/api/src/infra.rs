use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use sales_bonus::workflows::bonus::{
    BonusComputation, BonusStatus, EmployeeId, OrderEvaluationRecord, RecordsStore, Remark,
    RepositoryError, SocialPerformanceRecord, StatusPatch,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct RecordsInner {
    social: HashMap<(String, i32, String), SocialPerformanceRecord>,
    orders: HashMap<(String, i32, String), OrderEvaluationRecord>,
    computations: HashMap<(String, i32), BonusComputation>,
}

/// In-memory records store backing the service until a database sits behind
/// the trait. One mutex covers all three maps, which also makes `advance` a
/// proper compare-and-swap.
#[derive(Default)]
pub(crate) struct InMemoryRecordsStore {
    inner: Mutex<RecordsInner>,
}

impl InMemoryRecordsStore {
    /// Upsert keyed by (employee, year, criterion).
    pub(crate) fn put_social_record(&self, record: SocialPerformanceRecord) {
        let mut inner = self.inner.lock().expect("records mutex poisoned");
        inner.social.insert(
            (
                record.employee_id.0.clone(),
                record.year,
                record.criterion_key.clone(),
            ),
            record,
        );
    }

    /// Upsert keyed by (employee, year, order).
    pub(crate) fn put_order_record(&self, record: OrderEvaluationRecord) {
        let mut inner = self.inner.lock().expect("records mutex poisoned");
        inner.orders.insert(
            (
                record.employee_id.0.clone(),
                record.year,
                record.order_id.clone(),
            ),
            record,
        );
    }
}

impl RecordsStore for InMemoryRecordsStore {
    fn social_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<SocialPerformanceRecord>, RepositoryError> {
        let inner = self.inner.lock().expect("records mutex poisoned");
        let mut records: Vec<SocialPerformanceRecord> = inner
            .social
            .values()
            .filter(|record| &record.employee_id == employee_id && record.year == year)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.criterion_key.cmp(&b.criterion_key));
        Ok(records)
    }

    fn order_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<OrderEvaluationRecord>, RepositoryError> {
        let inner = self.inner.lock().expect("records mutex poisoned");
        let mut records: Vec<OrderEvaluationRecord> = inner
            .orders
            .values()
            .filter(|record| &record.employee_id == employee_id && record.year == year)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        Ok(records)
    }

    fn fetch_computation(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Option<BonusComputation>, RepositoryError> {
        let inner = self.inner.lock().expect("records mutex poisoned");
        Ok(inner
            .computations
            .get(&(employee_id.0.clone(), year))
            .cloned())
    }

    fn history(&self, employee_id: &EmployeeId) -> Result<Vec<BonusComputation>, RepositoryError> {
        let inner = self.inner.lock().expect("records mutex poisoned");
        let mut entries: Vec<BonusComputation> = inner
            .computations
            .values()
            .filter(|computation| &computation.employee_id == employee_id)
            .cloned()
            .collect();
        entries.sort_by_key(|computation| std::cmp::Reverse(computation.year));
        Ok(entries)
    }

    fn upsert_computation(
        &self,
        computation: BonusComputation,
    ) -> Result<BonusComputation, RepositoryError> {
        let mut inner = self.inner.lock().expect("records mutex poisoned");
        inner.computations.insert(
            (computation.employee_id.0.clone(), computation.year),
            computation.clone(),
        );
        Ok(computation)
    }

    fn advance(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        expected: &[BonusStatus],
        patch: StatusPatch,
    ) -> Result<BonusComputation, RepositoryError> {
        let mut inner = self.inner.lock().expect("records mutex poisoned");
        let computation = inner
            .computations
            .get_mut(&(employee_id.0.clone(), year))
            .ok_or(RepositoryError::NotFound)?;

        if !expected.contains(&computation.status) {
            return Err(RepositoryError::StatusConflict {
                expected: expected.to_vec(),
                actual: computation.status,
            });
        }

        computation.apply(&patch);
        Ok(computation.clone())
    }

    fn append_remark(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        remark: Remark,
    ) -> Result<BonusComputation, RepositoryError> {
        let mut inner = self.inner.lock().expect("records mutex poisoned");
        let computation = inner
            .computations
            .get_mut(&(employee_id.0.clone(), year))
            .ok_or(RepositoryError::NotFound)?;
        computation.remarks.push(remark);
        Ok(computation.clone())
    }
}
