//! Pure bonus scoring: per-record amounts, weight normalization, and pool
//! capping. No I/O; identical inputs always produce identical outputs after
//! rounding.

mod normalizer;
mod orders;
pub mod rounding;
mod social;

pub use normalizer::normalized_weights;

use serde::{Deserialize, Serialize};

use super::domain::{OrderEvaluationRecord, SocialPerformanceRecord};
use rounding::{clamp, round2};

/// Maximum currency amounts available per bonus category for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusPools {
    pub social_pool_eur: f64,
    pub orders_pool_eur: f64,
}

impl Default for BonusPools {
    fn default() -> Self {
        Self {
            social_pool_eur: 2000.0,
            orders_pool_eur: 1500.0,
        }
    }
}

/// Stateless engine applying the bonus formulas for one configured pool pair.
pub struct ScoringEngine {
    pools: BonusPools,
}

impl ScoringEngine {
    pub fn new(pools: BonusPools) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &BonusPools {
        &self.pools
    }

    /// Score a single social record with an explicit weight (callers that
    /// want set semantics should go through [`ScoringEngine::social_total`],
    /// which normalizes the weights first).
    pub fn score_social_record(
        &self,
        record: &SocialPerformanceRecord,
        weight: f64,
    ) -> ScoredSocialRecord {
        social::score_social_record(record, weight, self.pools.social_pool_eur)
    }

    pub fn score_order_record(&self, order: &OrderEvaluationRecord) -> ScoredOrderRecord {
        orders::score_order_record(order, self.pools.orders_pool_eur)
    }

    /// Normalize weights across the set, score each record, and cap the sum
    /// at the social pool.
    pub fn social_total(&self, records: &[SocialPerformanceRecord]) -> (f64, Vec<ScoredSocialRecord>) {
        let weights = normalized_weights(records);
        let scored: Vec<ScoredSocialRecord> = records
            .iter()
            .zip(weights)
            .map(|(record, weight)| self.score_social_record(record, weight))
            .collect();

        let sum: f64 = scored.iter().map(|entry| entry.computed_bonus_eur).sum();
        let capped = round2(clamp(0.0, round2(sum), self.pools.social_pool_eur));
        (capped, scored)
    }

    /// Sum per-order bonuses (each order is capped independently at 20% of
    /// the pool, so no normalization happens here) and cap at the orders pool.
    pub fn orders_total(&self, records: &[OrderEvaluationRecord]) -> (f64, Vec<ScoredOrderRecord>) {
        let scored: Vec<ScoredOrderRecord> = records
            .iter()
            .map(|order| self.score_order_record(order))
            .collect();

        let sum: f64 = scored.iter().map(|entry| entry.computed_bonus_eur).sum();
        let capped = round2(clamp(0.0, round2(sum), self.pools.orders_pool_eur));
        (capped, scored)
    }

    /// Compute both totals plus the grand total, with the full per-record
    /// audit snapshot.
    pub fn compute(
        &self,
        social: &[SocialPerformanceRecord],
        orders: &[OrderEvaluationRecord],
    ) -> ComputationOutcome {
        let (social_total_eur, social_records) = self.social_total(social);
        let (orders_total_eur, order_records) = self.orders_total(orders);

        ComputationOutcome {
            social_total_eur,
            orders_total_eur,
            total_bonus_eur: round2(social_total_eur + orders_total_eur),
            social_records,
            order_records,
            pools: self.pools,
        }
    }
}

/// Full result of one totals computation, kept as the audit snapshot on the
/// persisted bonus computation and as the cache value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationOutcome {
    pub social_total_eur: f64,
    pub orders_total_eur: f64,
    pub total_bonus_eur: f64,
    pub social_records: Vec<ScoredSocialRecord>,
    pub order_records: Vec<ScoredOrderRecord>,
    pub pools: BonusPools,
}

/// One social criterion's contribution with its explainability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSocialRecord {
    pub criterion_key: String,
    pub criterion_name: String,
    pub computed_bonus_eur: f64,
    pub breakdown: SocialBreakdown,
}

/// Every intermediate of the social formula. Transparency of the computation
/// is a correctness requirement, so the breakdown is a structured type rather
/// than a free-form map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialBreakdown {
    pub social_pool_eur: f64,
    pub weight: f64,
    pub max_for_criterion: f64,
    pub target_value: f64,
    pub actual_value: f64,
    pub achievement: f64,
    pub supervisor_rating: f64,
    pub peer_rating: f64,
    pub rating_factor: f64,
    pub factor: f64,
}

/// One order's contribution with its explainability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOrderRecord {
    pub order_id: String,
    pub product_name: String,
    pub client_name: String,
    pub computed_bonus_eur: f64,
    pub breakdown: OrderBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBreakdown {
    pub orders_pool_eur: f64,
    pub max_per_order: f64,
    pub closing_probability: f64,
    pub client_ranking: u8,
    pub ranking_factor: f64,
    pub items_count: u32,
    pub items_factor: f64,
    pub revenue_eur: f64,
    pub revenue_factor: f64,
    pub factor: f64,
}
