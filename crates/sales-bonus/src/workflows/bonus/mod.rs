//! Yearly sales bonus computation and approval workflow.
//!
//! Scoring is pure and stateless; persistence, the external HR tenant, and
//! the computation cache are reached only through the traits defined here, so
//! the whole workflow can be exercised with in-memory doubles.

pub mod cache;
pub mod domain;
pub mod hr;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use cache::{
    cache_key, CacheBackend, CacheError, ComputationCache, InMemoryComputationCache,
    SharedComputationCache,
};
pub use domain::{
    BonusStatus, EmployeeId, OrderEvaluationRecord, Remark, SocialPerformanceRecord,
};
pub use hr::{ExternalHrClient, HrStoreError, OrangeHrmClient};
pub use repository::{BonusComputation, RecordsStore, RepositoryError, StatusPatch};
pub use router::bonus_router;
pub use scoring::{
    BonusPools, ComputationOutcome, ScoredOrderRecord, ScoredSocialRecord, ScoringEngine,
};
pub use service::{BonusServiceError, BonusWorkflowService};
