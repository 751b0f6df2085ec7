//! Plateau estimation.
//!
//! The plateau is the median weight over the final `window` samples of a
//! series, taken as the near-asymptotic (fully reduced) reading.

use crate::error::{KineticsError, KineticsResult};
use crate::math::{median, tail};

/// Median of the last `window` weights.
///
/// The result must be usable as a normalizer: finite and strictly positive.
pub fn plateau_value(weight: &[f64], window: usize) -> KineticsResult<f64> {
    if window == 0 {
        return Err(KineticsError::Config("plateau window must be > 0 samples".to_string()));
    }

    let value = median(tail(weight, window)).unwrap_or(f64::NAN);
    if !(value.is_finite() && value > 0.0) {
        return Err(KineticsError::InvalidPlateau { value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_is_median_of_tail() {
        let w = [9.0, 9.0, 1.0, 3.0, 2.0];
        assert_eq!(plateau_value(&w, 3).unwrap(), 2.0);
        // A window larger than the series uses everything.
        assert_eq!(plateau_value(&w, 100).unwrap(), 3.0);
    }

    #[test]
    fn plateau_is_order_independent_within_window() {
        let a = [0.0, 0.0, 5.1, 4.9, 5.0, 5.3, 4.7];
        let b = [0.0, 0.0, 4.7, 5.3, 4.9, 5.0, 5.1];
        assert_eq!(plateau_value(&a, 5).unwrap(), plateau_value(&b, 5).unwrap());
    }

    #[test]
    fn halving_window_follows_monotone_trend() {
        // Strictly increasing tail: a shorter window sits later on the trend.
        let rising: Vec<f64> = (1..=400).map(|i| 1.0 + i as f64 * 1e-3).collect();
        let full = plateau_value(&rising, 180).unwrap();
        let half = plateau_value(&rising, 90).unwrap();
        assert!(half > full);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let full = plateau_value(&falling, 180).unwrap();
        let half = plateau_value(&falling, 90).unwrap();
        assert!(half < full);
    }

    #[test]
    fn zero_or_negative_plateau_is_rejected() {
        assert!(matches!(
            plateau_value(&[1.0, 0.0, 0.0], 2),
            Err(KineticsError::InvalidPlateau { value }) if value == 0.0
        ));
        assert!(matches!(
            plateau_value(&[-1.0, -2.0], 2),
            Err(KineticsError::InvalidPlateau { .. })
        ));
        assert!(matches!(plateau_value(&[], 2), Err(KineticsError::InvalidPlateau { .. })));
        assert!(matches!(plateau_value(&[1.0], 0), Err(KineticsError::Config(_))));
    }
}
