use super::super::domain::SocialPerformanceRecord;
use super::rounding::{clamp, round2};
use super::{ScoredSocialRecord, SocialBreakdown};

/// Score one social performance record against the social pool.
///
/// `weight` is the (possibly normalized) weight to apply, not the raw weight
/// stored on the record.
pub(crate) fn score_social_record(
    record: &SocialPerformanceRecord,
    weight: f64,
    social_pool_eur: f64,
) -> ScoredSocialRecord {
    let target = record.target_value.max(0.0);
    let actual = record.actual_value.max(0.0);

    // achievement: 0..1, capped so over-delivery never exceeds the criterion max
    let achievement = if target > 0.0 {
        clamp(0.0, actual / target, 1.0)
    } else {
        1.0
    };

    let supervisor_rating = clamp(1.0, f64::from(record.supervisor_rating), 5.0);
    let peer_rating = clamp(1.0, f64::from(record.peer_rating), 5.0);

    // ratingFactor: 0..1, supervisor weighted over peers
    let rating_factor = clamp(
        0.0,
        (0.6 * supervisor_rating + 0.4 * peer_rating) / 5.0,
        1.0,
    );

    let factor = clamp(0.0, achievement * rating_factor, 1.0);

    let max_for_criterion = weight * social_pool_eur;
    let computed_bonus_eur = round2(max_for_criterion * factor);

    ScoredSocialRecord {
        criterion_key: record.criterion_key.clone(),
        criterion_name: record.criterion_name.clone(),
        computed_bonus_eur,
        breakdown: SocialBreakdown {
            social_pool_eur,
            weight: round2(weight),
            max_for_criterion: round2(max_for_criterion),
            target_value: target,
            actual_value: actual,
            achievement: round2(achievement),
            supervisor_rating,
            peer_rating,
            rating_factor: round2(rating_factor),
            factor: round2(factor),
        },
    }
}
