//! SVG figure export through Plotters.
//!
//! One document per transform (`<dir>/<series>.svg`): specimen curves in
//! their display colours, fit overlays in black, legend in the lower right.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::domain::SeriesKind;
use crate::error::{KineticsError, KineticsResult};
use crate::plot::{Figure, X_LABEL};

pub const FIGURE_SIZE: (u32, u32) = (1000, 700);

pub fn svg_file_name(kind: SeriesKind) -> String {
    format!("{}.svg", kind.key())
}

/// Write every comparison figure of a run into `dir`.
pub fn write_figures(dir: &Path, run: &RunOutput, window: usize) -> KineticsResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| KineticsError::io(dir, e))?;

    let mut written = Vec::with_capacity(SeriesKind::FIGURES.len());
    for kind in SeriesKind::FIGURES {
        let figure = Figure::from_run(run, kind, window);
        let path = dir.join(svg_file_name(kind));
        render_svg(&figure, &path)?;
        written.push(path);
    }
    info!(dir = %dir.display(), figures = written.len(), "wrote SVG figures");
    Ok(written)
}

pub fn render_svg(figure: &Figure, path: &Path) -> KineticsResult<()> {
    draw_svg(figure, path).map_err(|e| KineticsError::io(path, std::io::Error::other(e.to_string())))
}

fn draw_svg(figure: &Figure, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let Some((x, y)) = figure.bounds() else {
        root.titled(&format!("{} (no drawable samples)", figure.title()), ("sans-serif", 24))?;
        root.present()?;
        return Ok(());
    };
    let pad = (y[1] - y[0]) * 0.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(figure.title(), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x[0]..x[1], (y[0] - pad)..(y[1] + pad))?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(figure.y_label())
        .x_labels(10)
        .draw()?;

    for s in &figure.series {
        let (r, g, b) = s.color.rgb();
        let color = RGBColor(r, g, b);
        for (i, seg) in s.segments.iter().enumerate() {
            let drawn = chart.draw_series(LineSeries::new(seg.iter().copied(), color.stroke_width(2)))?;
            // One legend entry per specimen, however many segments.
            if i == 0 {
                drawn
                    .label(s.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }
    }

    for fit in &figure.fits {
        chart
            .draw_series(LineSeries::new(fit.points.iter().copied(), BLACK.stroke_width(2)))?
            .label(fit.label.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_analysis;
    use crate::data::synth::{SynthConfig, write_synthetic_logs};
    use crate::domain::{AnalysisConfig, EngineConfig};
    use crate::registry::SpecimenRegistry;

    #[test]
    fn writes_one_svg_per_figure() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let registry = SpecimenRegistry::builtin();
        write_synthetic_logs(&registry, data.path(), &SynthConfig::default()).unwrap();

        let config = AnalysisConfig {
            data_dir: data.path().to_path_buf(),
            specimens_path: None,
            engine: EngineConfig::default(),
            plot_window_s: 1500,
            fit_ranges: vec!["iron-layer=0.01:0.03".parse().unwrap()],
        };
        let run = run_analysis(&config, &registry).unwrap();
        let written = write_figures(out.path(), &run, config.plot_window_s).unwrap();

        assert_eq!(written.len(), SeriesKind::FIGURES.len());
        let svg = fs::read_to_string(out.path().join("reduction.svg")).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Reduction fraction"));
        assert!(svg.contains("D=17.1mm"));
        assert!(out.path().join("external-mass-transfer.svg").is_file());
    }

    #[test]
    fn empty_figure_still_writes_a_document() {
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("empty.svg");
        let fig = Figure {
            kind: SeriesKind::InternalBurning,
            series: Vec::new(),
            fits: Vec::new(),
        };
        render_svg(&fig, &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("<svg"));
    }
}
