//! Least squares fitting.
//!
//! Fit overlays solve small linear regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - (a + b x_i))^2
//! ```
//!
//! Implementation choices:
//! - The design matrix `[1, x]` is solved through SVD, which stays well behaved
//!   for tall systems (thousands of per-second samples, two columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Degenerate inputs are rejected up front with typed errors instead of
//!   relying on the solver's tolerance.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitRange, SeriesFit};
use crate::error::{KineticsError, KineticsResult};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least squares line through paired samples.
///
/// Returns `(slope, intercept)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> KineticsResult<(f64, f64)> {
    if x.len() != y.len() {
        return Err(KineticsError::LengthMismatch { x: x.len(), y: y.len() });
    }
    let n = x.len();
    if n < 2 {
        return Err(KineticsError::TooFewPoints(n));
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let var_x = x.iter().map(|v| (v - mean_x) * (v - mean_x)).sum::<f64>();
    if !(var_x.is_finite() && var_x > 0.0) {
        return Err(KineticsError::DegenerateFit);
    }

    // Centering x keeps the two columns close to orthogonal for large time values.
    let mut design = DMatrix::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi - mean_x;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs).ok_or(KineticsError::DegenerateFit)?;
    let slope = beta[1];
    let intercept = beta[0] - slope * mean_x;
    Ok((slope, intercept))
}

/// Fit `values` against `time_s` over the samples whose value lies in the range.
///
/// Undefined (NaN) samples never fall inside a range.
pub fn fit_in_range(time_s: &[f64], values: &[f64], range: FitRange) -> KineticsResult<SeriesFit> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = time_s
        .iter()
        .zip(values)
        .filter(|&(_, &v)| v >= range.min && v <= range.max)
        .map(|(&t, &v)| (t, v))
        .unzip();

    let (slope, intercept) = linear_fit(&xs, &ys)?;
    let points = xs.iter().map(|&t| (t, slope * t + intercept)).collect();

    Ok(SeriesFit {
        range,
        slope,
        intercept,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesKind;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let (slope, intercept) = linear_fit(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-9, "slope={slope}");
        assert!(intercept.abs() < 1e-9, "intercept={intercept}");
    }

    #[test]
    fn linear_fit_handles_large_time_offsets() {
        let x: Vec<f64> = (0..500).map(|i| 4000.0 + i as f64).collect();
        let y: Vec<f64> = x.iter().map(|t| 1e-4 * t - 0.2).collect();
        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert!((slope - 1e-4).abs() < 1e-12);
        assert!((intercept + 0.2).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_rejects_degenerate_inputs() {
        assert!(matches!(linear_fit(&[1.0], &[1.0]), Err(KineticsError::TooFewPoints(1))));
        assert!(matches!(
            linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(KineticsError::DegenerateFit)
        ));
        assert!(matches!(
            linear_fit(&[1.0, 2.0], &[1.0]),
            Err(KineticsError::LengthMismatch { x: 2, y: 1 })
        ));
    }

    #[test]
    fn range_fit_uses_only_samples_inside_window() {
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        // Linear up to t=5, then flat; the window only sees the ramp.
        let v: Vec<f64> = t.iter().map(|&x| if x <= 5.0 { 0.1 * x } else { 0.5 }).collect();
        let mut v = v;
        v[2] = f64::NAN;

        let range = FitRange {
            series: SeriesKind::Reduction,
            min: 0.0,
            max: 0.45,
        };
        let fit = fit_in_range(&t, &v, range).unwrap();
        assert!((fit.slope - 0.1).abs() < 1e-9);
        assert_eq!(fit.points.len(), 4); // t = 0, 1, 3, 4
        assert!((fit.points[2].0 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn range_fit_with_empty_window_fails() {
        let range = FitRange {
            series: SeriesKind::Reduction,
            min: 5.0,
            max: 6.0,
        };
        let err = fit_in_range(&[0.0, 1.0], &[0.1, 0.2], range).unwrap_err();
        assert!(matches!(err, KineticsError::TooFewPoints(0)));
    }
}
