//! Min-max normalization of component arrays

/// Value every element takes when an array has no spread
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Scale values into [0, 1] with `(x - min) / (max - min)`.
///
/// When every finite value is equal, including a single element, each of
/// them maps to [`NEUTRAL_SCORE`]. Non-finite entries come from malformed
/// records; they map to 0.0 and do not take part in min/max.
pub fn min_max(values: &[f32]) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    let span = max - min;
    let degenerate = !span.is_finite() || span <= 0.0;

    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                0.0
            } else if degenerate {
                NEUTRAL_SCORE
            } else {
                ((v - min) / span).clamp(0.0, 1.0)
            }
        })
        .collect()
}
