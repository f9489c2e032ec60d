use super::super::domain::SocialPerformanceRecord;

/// Rescale the raw criterion weights so they sum to 1. When every weight is
/// zero (or the sum is otherwise non-positive) each record gets an equal
/// share; an empty set yields an empty vector.
///
/// Returns a transient weight vector aligned index-for-index with `records`.
/// The stored per-record weight is never mutated.
pub fn normalized_weights(records: &[SocialPerformanceRecord]) -> Vec<f64> {
    let sum: f64 = records.iter().map(|record| record.weight.max(0.0)).sum();

    if sum <= 0.0 {
        let equal = if records.is_empty() {
            0.0
        } else {
            1.0 / records.len() as f64
        };
        return vec![equal; records.len()];
    }

    records
        .iter()
        .map(|record| record.weight.max(0.0) / sum)
        .collect()
}
