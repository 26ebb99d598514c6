//! Noise gate for small anomaly patches.

/// Returns `percentage` if it is strictly above `minimum`, otherwise 0.
///
/// A percentage equal to the minimum is gated. Non-finite percentages
/// are gated too.
#[must_use]
pub fn gate(percentage: f64, minimum: f64) -> f64 {
    if percentage.is_finite() && percentage > minimum {
        percentage
    } else {
        0.0
    }
}
