use crate::core::quote::round_to;

/// Percentage move from `previous` to `current`, rounded to 2 decimals.
///
/// Returns 0 when there is no usable baseline: `previous` missing, zero, or
/// not a finite number.
pub fn percent_change(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev != 0.0 && prev.is_finite() && current.is_finite() => {
            round_to((current - prev) / prev * 100.0, 2)
        }
        _ => 0.0,
    }
}
