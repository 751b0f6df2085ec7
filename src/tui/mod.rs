//! Ratatui-based terminal UI.
//!
//! The TUI runs the analysis pipeline once, then shows one comparison figure
//! at a time (every specimen overlaid) with a legend of specimens, fits and
//! failed sources.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use tracing::{info, warn};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::TuiArgs;
use crate::domain::{AnalysisConfig, SeriesKind};
use crate::error::AppError;
use crate::plot::{Figure, X_LABEL};
use crate::registry::SpecimenRegistry;

mod plotters_chart;

use plotters_chart::KineticsChart;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let config = crate::app::analysis_config_from_args(&args.analysis);
    let registry = pipeline::load_registry(config.specimens_path.as_deref())?;
    let out_dir = args.out.clone().unwrap_or_else(crate::io::export::default_export_dir);
    let mut app = App::new(config, registry, out_dir);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: AnalysisConfig,
    registry: SpecimenRegistry,
    out_dir: PathBuf,
    run: Option<RunOutput>,
    figure_idx: usize,
    full_window: bool,
    status: String,
}

impl App {
    fn new(config: AnalysisConfig, registry: SpecimenRegistry, out_dir: PathBuf) -> Self {
        let mut app = Self {
            config,
            registry,
            out_dir,
            run: None,
            figure_idx: 0,
            full_window: false,
            status: String::new(),
        };
        app.reload();
        app
    }

    /// Re-run the analysis; a failed run is shown in the status line.
    fn reload(&mut self) {
        match pipeline::run_analysis(&self.config, &self.registry) {
            Ok(run) => {
                let ok = run.successes().count();
                let failed = run.failures().count();
                self.status = format!("Analyzed {ok} specimen(s), {failed} failed.");
                self.run = Some(run);
            }
            Err(err) => {
                warn!("analysis failed: {err}");
                self.status = err.to_string();
                self.run = None;
            }
        }
    }

    fn kind(&self) -> SeriesKind {
        SeriesKind::FIGURES[self.figure_idx % SeriesKind::FIGURES.len()]
    }

    fn window(&self) -> usize {
        if self.full_window { usize::MAX } else { self.config.plot_window_s }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n = SeriesKind::FIGURES.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => {
                self.figure_idx = (self.figure_idx + n - 1) % n;
                self.status = self.kind().title().to_string();
            }
            KeyCode::Right => {
                self.figure_idx = (self.figure_idx + 1) % n;
                self.status = self.kind().title().to_string();
            }
            KeyCode::Char('w') => {
                self.full_window = !self.full_window;
                self.status = format!("window: {}", self.window_label());
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('s') => self.write_figures(),
            KeyCode::Char('e') => self.write_exports(),
            _ => {}
        }
        false
    }

    fn write_figures(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to plot.".to_string();
            return;
        };
        self.status = match crate::plot::svg::write_figures(&self.out_dir, run, self.window()) {
            Ok(written) => {
                info!(figures = written.len(), "figures written from TUI");
                format!("Wrote {} figure(s) to {}", written.len(), self.out_dir.display())
            }
            Err(err) => format!("Figure write failed: {err}"),
        };
    }

    fn write_exports(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        self.status = match crate::io::export::write_run_exports(&self.out_dir, run) {
            Ok(written) => format!("Wrote {} export file(s) to {}", written.len(), self.out_dir.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn window_label(&self) -> String {
        if self.full_window {
            "full run".to_string()
        } else {
            format!("first {:.0} min", self.config.plot_window_s as f64 / 60.0)
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("pellets", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " | figure {}/{}: {}",
                self.figure_idx + 1,
                SeriesKind::FIGURES.len(),
                self.kind().title()
            )),
        ]));

        let (ok, failed) = self
            .run
            .as_ref()
            .map(|r| (r.successes().count(), r.failures().count()))
            .unwrap_or((0, 0));
        lines.push(Line::from(Span::styled(
            format!(
                "dir: {} | specimens: {ok} ok, {failed} failed | plateau: {} samples ({:?}) | window: {}",
                self.config.data_dir.display(),
                self.config.engine.plateau_window_len,
                self.config.engine.plateau_source,
                self.window_label(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);

        let figure = self.run.as_ref().map(|run| Figure::from_run(run, self.kind(), self.window()));
        self.draw_chart(frame, chunks[0], figure.as_ref());
        self.draw_legend(frame, chunks[1], figure.as_ref());
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, figure: Option<&Figure>) {
        let block = Block::default().title(self.kind().title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((figure, (x_bounds, y_bounds))) = figure.and_then(|f| f.bounds().map(|b| (f, b))) else {
            let msg = Paragraph::new("No drawable samples.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };
        let pad = ((y_bounds[1] - y_bounds[0]) * 0.05).max(1e-12);
        let y_bounds = [y_bounds[0] - pad, y_bounds[1] + pad];

        let (chart_rect, insets) = chart_layout(inner);
        let widget = KineticsChart {
            figure,
            x_bounds,
            y_bounds,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, figure.y_label());
        }
    }

    fn draw_legend(&self, frame: &mut ratatui::Frame<'_>, area: Rect, figure: Option<&Figure>) {
        let mut items = Vec::new();

        if let Some(figure) = figure {
            for s in &figure.series {
                let (r, g, b) = s.color.rgb();
                items.push(ListItem::new(Line::from(vec![
                    Span::styled("━━ ", Style::default().fg(Color::Rgb(r, g, b))),
                    Span::raw(s.label.clone()),
                ])));
            }
            for fit in &figure.fits {
                let lines: Vec<Line> = fit
                    .label
                    .lines()
                    .enumerate()
                    .map(|(i, l)| {
                        let marker = if i == 0 { "── " } else { "   " };
                        Line::from(vec![
                            Span::styled(marker, Style::default().fg(Color::White)),
                            Span::raw(l.to_string()),
                        ])
                    })
                    .collect();
                items.push(ListItem::new(Text::from(lines)));
            }
        }

        if let Some(run) = &self.run {
            for (outcome, err) in run.failures() {
                items.push(ListItem::new(Line::from(Span::styled(
                    format!("✗ {} [{}]", outcome.source_name, err.kind().label()),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))));
            }
            for (outcome, a) in run.successes() {
                for (range, err) in &a.fit_failures {
                    items.push(ListItem::new(Line::from(Span::styled(
                        format!("! {} {} fit: {err}", outcome.source_name, range.series),
                        Style::default().fg(Color::Yellow),
                    ))));
                }
            }
        }

        let list = List::new(items).block(Block::default().title("Legend").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ figure  w window  s save SVG  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_y(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(X_LABEL)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.saturating_sub(insets.right),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

/// Transforms span orders of magnitude (`ln(1-F)` vs iron-layer values).
fn fmt_axis_y(v: f64) -> String {
    if v.abs() >= 10.0 { format!("{v:.1}") } else { format!("{v:.3}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synth::{SynthConfig, write_synthetic_logs};
    use crate::domain::{DEFAULT_PLOT_WINDOW_S, EngineConfig};

    fn app_over(dir: &std::path::Path) -> App {
        let config = AnalysisConfig {
            data_dir: dir.to_path_buf(),
            specimens_path: None,
            engine: EngineConfig::default(),
            plot_window_s: DEFAULT_PLOT_WINDOW_S,
            fit_ranges: Vec::new(),
        };
        App::new(config, SpecimenRegistry::builtin(), dir.join("out"))
    }

    #[test]
    fn keys_cycle_figures_and_toggle_window() {
        let dir = tempfile::tempdir().unwrap();
        write_synthetic_logs(&SpecimenRegistry::builtin(), dir.path(), &SynthConfig::default()).unwrap();
        let mut app = app_over(dir.path());
        assert!(app.run.is_some());

        assert_eq!(app.kind(), SeriesKind::Reduction);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.kind(), SeriesKind::ExternalMassTransfer);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.kind(), SeriesKind::IronLayer);

        assert_eq!(app.window(), DEFAULT_PLOT_WINDOW_S);
        app.handle_key(KeyCode::Char('w'));
        assert_eq!(app.window(), usize::MAX);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn save_keys_write_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_synthetic_logs(&SpecimenRegistry::builtin(), dir.path(), &SynthConfig::default()).unwrap();
        let mut app = app_over(dir.path());

        app.handle_key(KeyCode::Char('s'));
        assert!(dir.path().join("out").join("reduction.svg").is_file(), "{}", app.status);
        app.handle_key(KeyCode::Char('e'));
        assert!(dir.path().join("out").join("manifest.json").is_file(), "{}", app.status);
    }

    #[test]
    fn empty_directory_is_shown_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_over(dir.path());
        assert!(app.run.is_none());
        assert!(app.status.contains("No balance logs"));
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.status, "Nothing to export.");
    }
}
