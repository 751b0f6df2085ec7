//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the kinetics code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::RunOutput;
use crate::domain::PlateauWindow;
use crate::registry::SpecimenRegistry;
use crate::report::SpecimenSummary;

/// Format the full run summary: settings, per-specimen table, fits, failures.
pub fn format_run_summary(run: &RunOutput) -> String {
    let cfg = &run.config;
    let ok = run.successes().count();
    let failed = run.failures().count();

    let mut out = String::new();
    out.push_str("=== pellets - Pellet Reduction Kinetics ===\n");
    out.push_str(&format!("Data: {}\n", cfg.data_dir.display()));
    out.push_str(&format!(
        "Plateau: last {} samples ({}) | max duration: {} s | plot window: {} s\n",
        cfg.engine.plateau_window_len,
        plateau_source_name(cfg.engine.plateau_source),
        cfg.engine.max_duration_s,
        cfg.plot_window_s,
    ));
    out.push_str(&format!("Specimens: {ok} analyzed, {failed} failed\n\n"));

    out.push_str(&format_specimen_results(run));

    let fit_rows: Vec<String> = run
        .successes()
        .flat_map(|(o, a)| {
            a.fits.iter().map(move |f| {
                format!(
                    "{:<20} {:<22} {:>17} {:>12.6} {:>12.6} {:>6}",
                    truncate(&o.source_name, 20),
                    f.range.series.key(),
                    format!("[{} - {}]", f.range.min, f.range.max),
                    f.slope * 60.0,
                    f.intercept,
                    f.points.len(),
                )
                .trim_end()
                .to_string()
            })
        })
        .collect();
    if !fit_rows.is_empty() {
        out.push_str("\nFits (slope per minute):\n");
        out.push_str(
            format!(
                "{:<20} {:<22} {:>17} {:>12} {:>12} {:>6}",
                "source", "series", "range", "slope/min", "intercept", "n"
            )
            .trim_end(),
        );
        out.push('\n');
        for row in fit_rows {
            out.push_str(&row);
            out.push('\n');
        }
    }

    let skipped: Vec<String> = run
        .successes()
        .flat_map(|(o, a)| {
            a.fit_failures.iter().map(move |(r, e)| {
                format!("  {} {} [{} - {}]: {e}", o.source_name, r.series, r.min, r.max)
            })
        })
        .collect();
    if !skipped.is_empty() {
        out.push_str("\nSkipped fits:\n");
        for line in skipped {
            out.push_str(&line);
            out.push('\n');
        }
    }

    if failed > 0 {
        out.push_str("\nFailures:\n");
        for (o, e) in run.failures() {
            out.push_str(&format!("  {} [{}] {e}\n", o.source_name, e.kind().label()));
        }
    }

    out
}

fn format_specimen_results(run: &RunOutput) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>3} {:<10} {:>7} {:>10} {:>8} {:>9} {:>9}\n",
            "source", "id", "label", "samples", "plateau", "final F", "t50 min", "undefined"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<3} {:-<10} {:-<7} {:-<10} {:-<8} {:-<9} {:-<9}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (o, a) in run.successes() {
        let s = SpecimenSummary::from_analysis(a);
        out.push_str(
            format!(
                "{:<20} {:>3} {:<10} {:>7} {:>10.5} {:>8.4} {:>9} {:>9}",
                truncate(&o.source_name, 20),
                s.specimen_id,
                truncate(&s.label, 10),
                s.samples,
                s.plateau_value,
                s.final_fraction,
                s.half_time_min.map(|t| format!("{t:.1}")).unwrap_or_else(|| "-".to_string()),
                s.undefined_samples,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the specimen table of a registry.
pub fn format_specimen_table(registry: &SpecimenRegistry) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>3} {:<10} {:<7} {:>9} {:>7} {:>10} {:>5} {:>9} {:>9}\n",
            "id", "label", "color", "mass g", "start s", "radius mm", "XRD", "Fe g", "O g"
        )
        .trim_end(),
    );
    out.push('\n');

    for s in registry.iter() {
        let marker = if s.provisional { "*" } else { "" };
        out.push_str(
            format!(
                "{:>3} {:<10} {:<7} {:>9.4} {:>7} {:>10.3} {:>5.2} {:>9.4} {:>9.4}",
                format!("{marker}{}", s.id),
                truncate(&s.display_label, 10),
                s.display_color.name(),
                s.initial_mass,
                s.start_time_s,
                s.initial_radius * 1000.0,
                s.reduction_correction_factor,
                s.iron_mass(),
                s.oxygen_mass(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if registry.iter().any(|s| s.provisional) {
        out.push_str("\n* provisional parameters, not measured\n");
    }

    out
}

fn plateau_source_name(source: PlateauWindow) -> &'static str {
    match source {
        PlateauWindow::AfterTruncation => "after truncation",
        PlateauWindow::BeforeTruncation => "before truncation",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
