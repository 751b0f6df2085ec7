//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - specimen curves: one marker character per specimen (`*`, `+`, `o`, ...)
//! - fit overlays: `=` lines, drawn first so they stay visible
//! - a legend under the grid

use crate::app::pipeline::RunOutput;
use crate::domain::SeriesKind;
use crate::plot::{Figure, X_LABEL};

const MARKERS: [char; 8] = ['*', '+', 'o', 'x', '#', '@', '%', '&'];
const FIT_MARKER: char = '=';

/// Render the figure for `kind` from a run.
pub fn render_figure(run: &RunOutput, kind: SeriesKind, window: usize, width: usize, height: usize) -> String {
    render_ascii(&Figure::from_run(run, kind, window), width, height)
}

pub fn render_ascii(figure: &Figure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x, y)) = figure.bounds() else {
        return format!("{}: no drawable samples\n", figure.title());
    };
    let [t_min, t_max] = x;
    let (y_min, y_max) = pad_range(y[0], y[1], 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for fit in &figure.fits {
        draw_polyline(&mut grid, &fit.points, FIT_MARKER, [t_min, t_max], [y_min, y_max]);
    }
    for (i, s) in figure.series.iter().enumerate() {
        let ch = MARKERS[i % MARKERS.len()];
        for seg in &s.segments {
            draw_polyline(&mut grid, seg, ch, [t_min, t_max], [y_min, y_max]);
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{} | {X_LABEL}=[{t_min:.1}, {t_max:.1}] | {}=[{y_min:.3}, {y_max:.3}]\n",
        figure.title(),
        figure.y_label()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (i, s) in figure.series.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", MARKERS[i % MARKERS.len()], s.label));
    }
    for fit in &figure.fits {
        out.push_str(&format!("  {FIT_MARKER} {}\n", fit.label.replace('\n', " ")));
    }

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(f64, f64)], ch: char, x: [f64; 2], y: [f64; 2]) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, v) in points {
        let col = map_x(t, x[0], x[1], width);
        let row = map_y(v, y[0], y[1], height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None if grid[row][col] == ' ' => grid[row][col] = ch,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DisplayColor;
    use crate::plot::{FigureSeries, FitLine};

    #[test]
    fn plot_golden_snapshot_small() {
        let fig = Figure {
            kind: SeriesKind::Reduction,
            series: vec![
                FigureSeries {
                    label: "D=17.1mm".to_string(),
                    color: DisplayColor::Blue,
                    segments: vec![vec![(0.0, 0.0), (9.0, 1.0)]],
                },
                FigureSeries {
                    label: "D=9.5mm".to_string(),
                    color: DisplayColor::Green,
                    segments: vec![vec![(0.0, 1.0), (9.0, 1.0)]],
                },
            ],
            fits: vec![FitLine {
                label: "D=9.5mm\nRange:[0.4 - 0.5] Slope = 0.0010".to_string(),
                points: vec![(0.0, 0.5), (9.0, 0.5)],
            }],
        };

        let txt = render_ascii(&fig, 10, 5);
        let expected = concat!(
            "Reduction fraction | Time (min)=[0.0, 9.0] | F=[-0.050, 1.050]\n",
            "++++++++**\n",
            "      **  \n",
            "==========\n",
            "  **      \n",
            "**        \n",
            "  * D=17.1mm\n",
            "  + D=9.5mm\n",
            "  = D=9.5mm Range:[0.4 - 0.5] Slope = 0.0010\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_figure_says_so() {
        let fig = Figure {
            kind: SeriesKind::InternalBurning,
            series: Vec::new(),
            fits: Vec::new(),
        };
        assert_eq!(render_ascii(&fig, 20, 5), "Complete internal burning: no drawable samples\n");
    }
}
