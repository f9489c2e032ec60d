/// Round half-up to 2 decimal places. The epsilon nudge counters binary
/// floating-point representations sitting just below the .xx5 boundary
/// (e.g. 2.675 stored as 2.67499…), so currency amounts round the way a
/// human would.
pub fn round2(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

/// Clamp `value` into [min, max]. Argument order mirrors how the formulas
/// read: `clamp(0.0, achievement, 1.0)`.
pub fn clamp(min: f64, value: f64, max: f64) -> f64 {
    value.clamp(min, max)
}
