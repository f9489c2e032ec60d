use super::common::*;
use crate::workflows::bonus::scoring::{normalized_weights, BonusPools, ScoringEngine};

fn engine() -> ScoringEngine {
    ScoringEngine::new(pools())
}

#[test]
fn full_achievement_and_top_ratings_exhaust_the_weighted_pool() {
    // targetValue 10, actualValue 10, weight 1, ratings 5/5, pool 2000
    let record = social_record("leadership", 10.0, 10.0, 1.0);
    let scored = engine().score_social_record(&record, 1.0);

    assert_eq!(scored.breakdown.achievement, 1.0);
    assert_eq!(scored.breakdown.rating_factor, 1.0);
    assert_eq!(scored.breakdown.factor, 1.0);
    assert_eq!(scored.breakdown.max_for_criterion, 2000.0);
    assert_eq!(scored.computed_bonus_eur, 2000.0);
}

#[test]
fn partial_achievement_scales_the_criterion_bonus() {
    let record = social_record("openness", 10.0, 5.0, 0.4);
    let scored = engine().score_social_record(&record, 0.4);

    assert_eq!(scored.breakdown.achievement, 0.5);
    assert_eq!(scored.computed_bonus_eur, 400.0);
}

#[test]
fn ratings_blend_supervisor_heavier_than_peers() {
    let mut record = social_record("teamwork", 10.0, 10.0, 1.0);
    record.supervisor_rating = 3;
    record.peer_rating = 4;
    let scored = engine().score_social_record(&record, 1.0);

    // (0.6*3 + 0.4*4)/5 = 0.68
    assert_eq!(scored.breakdown.rating_factor, 0.68);
    assert_eq!(scored.computed_bonus_eur, 1360.0);

    record.supervisor_rating = 1;
    record.peer_rating = 1;
    let floor = engine().score_social_record(&record, 1.0);
    assert_eq!(floor.breakdown.rating_factor, 0.2);
}

#[test]
fn zero_target_counts_as_full_achievement() {
    let record = social_record("integrity", 0.0, 0.0, 0.5);
    let scored = engine().score_social_record(&record, 0.5);
    assert_eq!(scored.breakdown.achievement, 1.0);
    assert_eq!(scored.computed_bonus_eur, 1000.0);
}

#[test]
fn over_achievement_is_capped_at_the_criterion_maximum() {
    let record = social_record("communication", 10.0, 30.0, 1.0);
    let scored = engine().score_social_record(&record, 1.0);
    assert_eq!(scored.breakdown.achievement, 1.0);
    assert_eq!(scored.computed_bonus_eur, 2000.0);
}

#[test]
fn worst_order_still_earns_the_ranking_floor() {
    // clientRanking 5, closingProbability 0, items 0, revenue 0, pool 1500
    let order = order_record("B-1", 5, 0.0, 0, 0.0);
    let scored = engine().score_order_record(&order);

    assert_eq!(scored.breakdown.ranking_factor, 0.2);
    assert_eq!(scored.breakdown.factor, 0.05);
    assert_eq!(scored.breakdown.max_per_order, 300.0);
    assert_eq!(scored.computed_bonus_eur, 15.0);
}

#[test]
fn perfect_order_takes_the_full_per_order_slice() {
    let order = order_record("A-1", 1, 1.0, 10, 10_000.0);
    let scored = engine().score_order_record(&order);

    assert_eq!(scored.breakdown.ranking_factor, 1.0);
    assert_eq!(scored.breakdown.items_factor, 1.0);
    assert_eq!(scored.breakdown.revenue_factor, 1.0);
    assert_eq!(scored.breakdown.factor, 1.0);
    assert_eq!(scored.computed_bonus_eur, 300.0);
}

#[test]
fn ranking_maps_linearly_between_floor_and_ceiling() {
    let order = order_record("C-1", 3, 0.0, 0, 0.0);
    let scored = engine().score_order_record(&order);
    assert_eq!(scored.breakdown.ranking_factor, 0.6);
}

#[test]
fn per_record_bonuses_stay_within_their_slices() {
    let engine = engine();
    for target in [0.0, 5.0, 10.0] {
        for actual in [0.0, 5.0, 25.0] {
            for weight in [0.0, 0.3, 1.0] {
                let record = social_record("grid", target, actual, weight);
                let scored = engine.score_social_record(&record, weight);
                assert!(scored.computed_bonus_eur >= 0.0);
                assert!(scored.computed_bonus_eur <= weight * pools().social_pool_eur + 0.01);
            }
        }
    }

    for ranking in 1..=5 {
        for items in [0, 5, 50] {
            for revenue in [0.0, 5000.0, 50_000.0] {
                let order = order_record("grid", ranking, 0.7, items, revenue);
                let scored = engine.score_order_record(&order);
                assert!(scored.computed_bonus_eur >= 0.0);
                assert!(scored.computed_bonus_eur <= 0.2 * pools().orders_pool_eur + 0.01);
            }
        }
    }
}

#[test]
fn social_total_is_capped_by_the_pool() {
    let records: Vec<_> = (0..50)
        .map(|i| social_record(&format!("c{i}"), 1.0, 1.0, 1.0))
        .collect();
    let (total, scored) = engine().social_total(&records);

    assert_eq!(scored.len(), 50);
    assert!(total <= pools().social_pool_eur);
    assert_eq!(total, 2000.0);
}

#[test]
fn orders_total_is_capped_by_the_pool() {
    let orders: Vec<_> = (0..50)
        .map(|i| order_record(&format!("o{i}"), 1, 1.0, 10, 10_000.0))
        .collect();
    let (total, scored) = engine().orders_total(&orders);

    // 50 perfect orders would claim 15 000 EUR uncapped.
    assert_eq!(scored.len(), 50);
    assert_eq!(total, pools().orders_pool_eur);
}

#[test]
fn empty_record_sets_produce_zero_totals() {
    let outcome = engine().compute(&[], &[]);
    assert_eq!(outcome.social_total_eur, 0.0);
    assert_eq!(outcome.orders_total_eur, 0.0);
    assert_eq!(outcome.total_bonus_eur, 0.0);
    assert!(outcome.social_records.is_empty());
    assert!(outcome.order_records.is_empty());
}

#[test]
fn normalized_weights_sum_to_one() {
    let records = vec![
        social_record("a", 10.0, 10.0, 0.2),
        social_record("b", 10.0, 10.0, 0.3),
        social_record("c", 10.0, 10.0, 0.5),
    ];
    let weights = normalized_weights(&records);
    let sum: f64 = weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);

    let skewed = vec![
        social_record("a", 10.0, 10.0, 0.9),
        social_record("b", 10.0, 10.0, 0.9),
    ];
    let weights = normalized_weights(&skewed);
    assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!((weights[0] - 0.5).abs() < 1e-9);
}

#[test]
fn all_zero_weights_split_equally() {
    let records = vec![
        social_record("a", 10.0, 10.0, 0.0),
        social_record("b", 10.0, 10.0, 0.0),
        social_record("c", 10.0, 10.0, 0.0),
    ];
    let weights = normalized_weights(&records);
    for weight in &weights {
        assert!((weight - 1.0 / 3.0).abs() < 1e-9);
    }

    assert!(normalized_weights(&[]).is_empty());
}

#[test]
fn normalization_never_rewrites_the_stored_weight() {
    let records = vec![
        social_record("a", 10.0, 10.0, 0.9),
        social_record("b", 10.0, 10.0, 0.9),
    ];
    let (_, scored) = engine().social_total(&records);

    // The transient weight is normalized; the input records keep theirs.
    assert_eq!(scored[0].breakdown.weight, 0.5);
    assert_eq!(records[0].weight, 0.9);
}

#[test]
fn computation_is_deterministic() {
    let social = vec![
        social_record("a", 10.0, 7.0, 0.6),
        social_record("b", 8.0, 3.0, 0.4),
    ];
    let orders = vec![
        order_record("o1", 2, 0.8, 4, 2500.0),
        order_record("o2", 4, 0.1, 1, 900.0),
    ];

    let engine = engine();
    let first = engine.compute(&social, &orders);
    let second = engine.compute(&social, &orders);

    assert_eq!(first, second);
    assert_eq!(
        first.total_bonus_eur,
        crate::workflows::bonus::scoring::rounding::round2(
            first.social_total_eur + first.orders_total_eur
        )
    );
}

#[test]
fn pools_default_to_the_configured_amounts() {
    let defaults = BonusPools::default();
    assert_eq!(defaults.social_pool_eur, 2000.0);
    assert_eq!(defaults.orders_pool_eur, 1500.0);
}
