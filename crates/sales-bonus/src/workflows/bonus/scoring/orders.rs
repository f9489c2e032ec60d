use super::super::domain::OrderEvaluationRecord;
use super::rounding::{clamp, round2};
use super::{OrderBreakdown, ScoredOrderRecord};

// Sanity ceilings on synced CRM data; beyond these the factors saturate anyway.
const MAX_ITEMS: f64 = 100_000.0;
const MAX_REVENUE_EUR: f64 = 1e12;

/// Score one order evaluation against the orders pool. Every order competes
/// for the same fixed 20% slice of the pool, independent of order count.
pub(crate) fn score_order_record(
    order: &OrderEvaluationRecord,
    orders_pool_eur: f64,
) -> ScoredOrderRecord {
    let closing_probability = clamp(0.0, order.closing_probability, 1.0);
    let client_ranking = clamp(1.0, f64::from(order.client_ranking), 5.0);

    // rankingFactor: ranking 1 -> 1.0, ranking 5 -> 0.2
    let ranking_factor = round2(clamp(0.2, (6.0 - client_ranking) / 5.0, 1.0));

    let items_count = clamp(0.0, f64::from(order.items_count), MAX_ITEMS);
    let revenue_eur = clamp(0.0, order.revenue_eur, MAX_REVENUE_EUR);

    let items_factor = clamp(0.0, items_count / 10.0, 1.0);
    let revenue_factor = clamp(0.0, revenue_eur / 10_000.0, 1.0);

    let factor = round2(clamp(
        0.0,
        (closing_probability + ranking_factor + items_factor + revenue_factor) / 4.0,
        1.0,
    ));

    let max_per_order = orders_pool_eur * 0.2;
    let computed_bonus_eur = round2(max_per_order * factor);

    ScoredOrderRecord {
        order_id: order.order_id.clone(),
        product_name: order.product_name.clone(),
        client_name: order.client_name.clone(),
        computed_bonus_eur,
        breakdown: OrderBreakdown {
            orders_pool_eur,
            max_per_order: round2(max_per_order),
            closing_probability: round2(closing_probability),
            client_ranking: order.client_ranking,
            ranking_factor,
            items_count: order.items_count,
            items_factor: round2(items_factor),
            revenue_eur: round2(revenue_eur),
            revenue_factor: round2(revenue_factor),
            factor,
        },
    }
}
