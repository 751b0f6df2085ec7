//! Figure rendering.
//!
//! A [`Figure`] is a render-only description of one comparison plot: one
//! transform, every analyzed specimen overlaid, plus the fit overlays on that
//! transform. It is built once from a run and then drawn by:
//!
//! - `ascii`: fixed-size terminal grid
//! - `svg`: Plotters SVG document
//! - the TUI chart widget
//!
//! Time is shown in minutes. Undefined (NaN) samples split a curve into
//! segments instead of being drawn.

use crate::app::pipeline::RunOutput;
use crate::domain::{DisplayColor, SeriesKind};

pub mod ascii;
pub mod svg;

pub const X_LABEL: &str = "Time (min)";

/// One specimen curve.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSeries {
    pub label: String,
    pub color: DisplayColor,
    /// Runs of consecutive finite samples, `(minutes, value)`.
    pub segments: Vec<Vec<(f64, f64)>>,
}

/// One fit overlay, always drawn in black.
#[derive(Debug, Clone, PartialEq)]
pub struct FitLine {
    /// Specimen label with the range/slope suffix.
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub kind: SeriesKind,
    pub series: Vec<FigureSeries>,
    pub fits: Vec<FitLine>,
}

impl Figure {
    /// Build the figure for `kind` over the first `window` samples of each bundle.
    pub fn from_run(run: &RunOutput, kind: SeriesKind, window: usize) -> Self {
        let mut series = Vec::new();
        let mut fits = Vec::new();

        for (_, a) in run.successes() {
            let n = a.bundle.len().min(window);
            series.push(FigureSeries {
                label: a.specimen.display_label.clone(),
                color: a.specimen.display_color,
                segments: finite_segments(&a.bundle.time_s[..n], &a.bundle.series(kind)[..n]),
            });

            let window_end = a.bundle.time_s.get(n.saturating_sub(1)).copied().unwrap_or(0.0);
            for fit in a.fits.iter().filter(|f| f.range.series == kind) {
                fits.push(FitLine {
                    label: format!("{}{}", a.specimen.display_label, fit.legend_suffix()),
                    points: fit
                        .points
                        .iter()
                        .filter(|&&(t, _)| t <= window_end)
                        .map(|&(t, y)| (t / 60.0, y))
                        .collect(),
                });
            }
        }

        Self { kind, series, fits }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn y_label(&self) -> &'static str {
        self.kind.axis_label()
    }

    /// Bounds over every drawn point, `None` when nothing is drawable.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];

        let curve_points = self.series.iter().flat_map(|s| s.segments.iter().flatten());
        let fit_points = self.fits.iter().flat_map(|f| f.points.iter());
        for &(px, py) in curve_points.chain(fit_points) {
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }

        if x[0].is_finite() && y[0].is_finite() {
            Some((widen(x), widen(y)))
        } else {
            None
        }
    }
}

/// Split `(t, v)` pairs into runs of finite values; time is converted to minutes.
pub fn finite_segments(time_s: &[f64], values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (&t, &v) in time_s.iter().zip(values) {
        if v.is_finite() {
            current.push((t / 60.0, v));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Give a zero-width range some extent so it can be mapped.
fn widen(r: [f64; 2]) -> [f64; 2] {
    if r[1] > r[0] {
        r
    } else {
        let pad = (r[0].abs() * 0.05).max(1e-6);
        [r[0] - pad, r[1] + pad]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_samples_split_segments() {
        let t = [0.0, 60.0, 120.0, 180.0, 240.0];
        let v = [0.1, f64::NAN, 0.3, 0.4, f64::NAN];
        let segs = finite_segments(&t, &v);
        assert_eq!(segs, vec![vec![(0.0, 0.1)], vec![(2.0, 0.3), (3.0, 0.4)]]);
        assert!(finite_segments(&t, &[f64::NAN; 5]).is_empty());
    }

    #[test]
    fn bounds_cover_curves_and_fits() {
        let fig = Figure {
            kind: SeriesKind::Reduction,
            series: vec![FigureSeries {
                label: "a".to_string(),
                color: DisplayColor::Blue,
                segments: vec![vec![(0.0, 0.0), (10.0, 0.8)]],
            }],
            fits: vec![FitLine {
                label: "fit".to_string(),
                points: vec![(2.0, -0.1), (4.0, 0.9)],
            }],
        };
        let (x, y) = fig.bounds().unwrap();
        assert_eq!(x, [0.0, 10.0]);
        assert_eq!(y, [-0.1, 0.9]);
    }

    #[test]
    fn flat_or_empty_figures() {
        let mut fig = Figure {
            kind: SeriesKind::ExternalMassTransfer,
            series: vec![FigureSeries {
                label: "a".to_string(),
                color: DisplayColor::Red,
                segments: vec![vec![(0.0, 1.0), (5.0, 1.0)]],
            }],
            fits: Vec::new(),
        };
        let (_, y) = fig.bounds().unwrap();
        assert!(y[0] < 1.0 && y[1] > 1.0);

        fig.series.clear();
        assert!(fig.bounds().is_none());
    }
}
