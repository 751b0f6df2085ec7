//! Plotters-powered kinetics chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - the same drawing calls as the SVG export
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::Figure;

/// A render-only chart of one [`Figure`].
///
/// Bounds are computed outside the render call so `render()` only draws.
pub struct KineticsChart<'a> {
    pub figure: &'a Figure,
    /// X bounds (minutes).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for KineticsChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let figure = self.figure;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines clutter low-resolution terminal rendering; axes are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            for s in &figure.series {
                let (r, g, b) = s.color.rgb();
                let color = RGBColor(r, g, b);
                for seg in &s.segments {
                    chart.draw_series(LineSeries::new(seg.iter().copied(), &color))?;
                }
            }

            // Fit overlays are black on paper; white keeps them visible on a
            // dark terminal.
            for fit in &figure.fits {
                chart.draw_series(LineSeries::new(fit.points.iter().copied(), &WHITE))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
