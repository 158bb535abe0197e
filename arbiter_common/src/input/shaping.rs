//! Analog input shaping: deadband and analog-to-boolean thresholds.

/// Suppress small-signal noise around zero.
///
/// Values with `|value| < threshold` map to exactly `0.0`; everything at or
/// above the threshold passes through unmodified.
#[inline]
pub fn apply_deadband(value: f64, threshold: f64) -> f64 {
    if value.abs() < threshold { 0.0 } else { value }
}

/// Convert an analog axis into a boolean trigger condition (`value > threshold`).
#[inline]
pub fn exceeds_threshold(value: f64, threshold: f64) -> bool {
    value > threshold
}
