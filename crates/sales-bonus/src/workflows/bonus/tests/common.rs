use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::bonus::cache::{CacheError, ComputationCache, InMemoryComputationCache};
use crate::workflows::bonus::domain::{
    BonusStatus, EmployeeId, OrderEvaluationRecord, Remark, SocialPerformanceRecord,
};
use crate::workflows::bonus::hr::{ExternalHrClient, HrStoreError};
use crate::workflows::bonus::repository::{
    BonusComputation, RecordsStore, RepositoryError, StatusPatch,
};
use crate::workflows::bonus::scoring::{BonusPools, ComputationOutcome};
use crate::workflows::bonus::BonusWorkflowService;

pub(super) const YEAR: i32 = 2025;

pub(super) fn employee() -> EmployeeId {
    EmployeeId("90001".to_string())
}

pub(super) fn pools() -> BonusPools {
    BonusPools {
        social_pool_eur: 2000.0,
        orders_pool_eur: 1500.0,
    }
}

pub(super) fn social_record(
    criterion_key: &str,
    target_value: f64,
    actual_value: f64,
    weight: f64,
) -> SocialPerformanceRecord {
    SocialPerformanceRecord {
        employee_id: employee(),
        year: YEAR,
        criterion_key: criterion_key.to_string(),
        criterion_name: criterion_key.to_string(),
        target_value,
        actual_value,
        weight,
        supervisor_rating: 5,
        peer_rating: 5,
        computed_bonus_eur: 0.0,
        remark: String::new(),
    }
}

pub(super) fn order_record(
    order_id: &str,
    client_ranking: u8,
    closing_probability: f64,
    items_count: u32,
    revenue_eur: f64,
) -> OrderEvaluationRecord {
    OrderEvaluationRecord {
        employee_id: employee(),
        year: YEAR,
        order_id: order_id.to_string(),
        product_name: "HooverClean Pro".to_string(),
        client_name: "Fixture GmbH".to_string(),
        client_ranking,
        closing_probability,
        items_count,
        revenue_eur,
        computed_bonus_eur: 0.0,
        remark: String::new(),
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    social: Vec<SocialPerformanceRecord>,
    orders: Vec<OrderEvaluationRecord>,
    computations: HashMap<(String, i32), BonusComputation>,
}

/// In-memory records store. `advance` checks and mutates under one lock,
/// giving the compare-and-swap guarantee the trait requires.
#[derive(Default)]
pub(super) struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub(super) fn seed_social(&self, record: SocialPerformanceRecord) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .social
            .push(record);
    }

    pub(super) fn seed_order(&self, record: OrderEvaluationRecord) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .orders
            .push(record);
    }
}

impl RecordsStore for MemoryStore {
    fn social_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<SocialPerformanceRecord>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .social
            .iter()
            .filter(|record| &record.employee_id == employee_id && record.year == year)
            .cloned()
            .collect())
    }

    fn order_records(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<OrderEvaluationRecord>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .orders
            .iter()
            .filter(|record| &record.employee_id == employee_id && record.year == year)
            .cloned()
            .collect())
    }

    fn fetch_computation(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Option<BonusComputation>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .computations
            .get(&(employee_id.0.clone(), year))
            .cloned())
    }

    fn history(&self, employee_id: &EmployeeId) -> Result<Vec<BonusComputation>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
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
        let mut inner = self.inner.lock().expect("store mutex poisoned");
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
        let mut inner = self.inner.lock().expect("store mutex poisoned");
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
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let computation = inner
            .computations
            .get_mut(&(employee_id.0.clone(), year))
            .ok_or(RepositoryError::NotFound)?;
        computation.remarks.push(remark);
        Ok(computation.clone())
    }
}

/// HR client double recording every store call.
#[derive(Default)]
pub(super) struct RecordingHrClient {
    calls: Mutex<Vec<(String, i32, f64)>>,
}

impl RecordingHrClient {
    pub(super) fn calls(&self) -> Vec<(String, i32, f64)> {
        self.calls.lock().expect("hr mutex poisoned").clone()
    }
}

impl ExternalHrClient for RecordingHrClient {
    fn store_total_bonus(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        total_bonus_eur: f64,
    ) -> Result<(), HrStoreError> {
        self.calls
            .lock()
            .expect("hr mutex poisoned")
            .push((employee_id.0.clone(), year, total_bonus_eur));
        Ok(())
    }
}

/// HR client double that always fails with a retryable transport error.
pub(super) struct UnreachableHrClient;

impl ExternalHrClient for UnreachableHrClient {
    fn store_total_bonus(
        &self,
        _employee_id: &EmployeeId,
        _year: i32,
        _total_bonus_eur: f64,
    ) -> Result<(), HrStoreError> {
        Err(HrStoreError::Transport("connection refused".to_string()))
    }
}

/// Cache double that counts reads and writes while delegating to the
/// in-memory implementation.
#[derive(Default)]
pub(super) struct SpyCache {
    inner: InMemoryComputationCache,
    gets: Mutex<usize>,
    sets: Mutex<usize>,
}

impl SpyCache {
    pub(super) fn get_calls(&self) -> usize {
        *self.gets.lock().expect("spy mutex poisoned")
    }

    pub(super) fn set_calls(&self) -> usize {
        *self.sets.lock().expect("spy mutex poisoned")
    }
}

impl ComputationCache for SpyCache {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        *self.gets.lock().expect("spy mutex poisoned") += 1;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError> {
        *self.sets.lock().expect("spy mutex poisoned") += 1;
        self.inner.set(key, value, ttl)
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        self.inner.del(key)
    }
}

/// Cache double whose reads block the calling thread, standing in for a slow
/// shared cache on the network.
pub(super) struct SlowCache {
    inner: InMemoryComputationCache,
    read_delay: Duration,
}

impl SlowCache {
    pub(super) fn with_read_delay(read_delay: Duration) -> Self {
        Self {
            inner: InMemoryComputationCache::new(),
            read_delay,
        }
    }
}

impl ComputationCache for SlowCache {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        std::thread::sleep(self.read_delay);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl)
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        self.inner.del(key)
    }
}

/// Cache double where every operation fails; computations must still succeed.
pub(super) struct BrokenCache;

impl ComputationCache for BrokenCache {
    fn get(&self, _key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        Err(CacheError::Unavailable("store offline".to_string()))
    }

    fn set(
        &self,
        _key: &str,
        _value: &ComputationOutcome,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("store offline".to_string()))
    }

    fn del(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("store offline".to_string()))
    }
}

pub(super) type TestService = BonusWorkflowService<MemoryStore, RecordingHrClient, SpyCache>;

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryStore>, Arc<RecordingHrClient>, Arc<SpyCache>) {
    let store = Arc::new(MemoryStore::default());
    let hr = Arc::new(RecordingHrClient::default());
    let cache = Arc::new(SpyCache::default());
    let service = Arc::new(BonusWorkflowService::new(
        store.clone(),
        hr.clone(),
        cache.clone(),
        pools(),
        Duration::from_secs(60),
    ));
    (service, store, hr, cache)
}

pub(super) fn seed_default_records(store: &MemoryStore) {
    store.seed_social(social_record("leadership", 10.0, 10.0, 0.6));
    store.seed_social(social_record("openness", 10.0, 5.0, 0.4));
    store.seed_order(order_record("A-100", 1, 1.0, 10, 10_000.0));
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
