use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, FontId, Pos2, RichText, ScrollArea, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};
use rusty_econ::analysis::{CrossSection, Panel, Proportions};
use rusty_econ::notice::Severity;
use rusty_econ::session::IndicatorAnalysis;

use crate::color::ColorMap;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render notices and every analysed indicator.
pub fn report_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(
                "1. Open catalog and observations  2. Select source and indicators  \
                 3. Select countries  4. Select display types",
            );
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for notice in report.notices.visible(state.show_warnings) {
                let color = match notice.severity {
                    Severity::Error => Color32::RED,
                    Severity::Warning => Color32::from_rgb(230, 160, 0),
                    Severity::Info => Color32::GRAY,
                };
                ui.colored_label(color, notice.kind.to_string());
            }

            for analysis in &report.analyses {
                ui.separator();
                analysis_view(ui, state, analysis);
            }
        });
}

fn analysis_view(ui: &mut Ui, state: &AppState, analysis: &IndicatorAnalysis) {
    let charts = state.charts;
    let colors = &state.color_map;
    let id = analysis.indicator.id.as_str();

    ui.heading(&analysis.indicator.name);
    ui.label(RichText::new(id).monospace());

    // Line chart with the full time series.
    if charts.line {
        line_chart(ui, id, &analysis.panel, colors);
    }

    // Bar charts of the last and first cross-sections.
    if charts.bar {
        bar_chart(ui, &format!("{id}_last"), "Last", &analysis.extremes.last, colors);
        bar_chart(ui, &format!("{id}_first"), "First", &analysis.extremes.first, colors);
    }

    if charts.pie {
        if let Some(pies) = &analysis.pies {
            ui.horizontal(|ui: &mut Ui| {
                pie_chart(ui, &pie_title("Last", &pies.last), &pies.last, colors);
                pie_chart(ui, &pie_title("First", &pies.first), &pies.first, colors);
            });
        }
    }

    if charts.table {
        ui.push_id(id, |ui: &mut Ui| data_table(ui, &analysis.panel));
    }

    // Explanation of the indicator.
    if !analysis.indicator.source_note.is_empty() {
        ui.label(RichText::new(&analysis.indicator.source_note).small().weak());
    }
}

// ---------------------------------------------------------------------------
// Line chart
// ---------------------------------------------------------------------------

/// x coordinate per row: the year for annual data, else a chronological index.
fn x_positions(panel: &Panel) -> Vec<f64> {
    let annual = panel.periods().iter().all(|p| p.as_str().len() == 4);
    panel
        .periods()
        .iter()
        .enumerate()
        .map(|(row, p)| match p.year() {
            Some(year) if annual => year,
            _ => (panel.height() - 1 - row) as f64,
        })
        .collect()
}

fn line_chart(ui: &mut Ui, id: &str, panel: &Panel, colors: &ColorMap) {
    let xs = x_positions(panel);
    Plot::new(format!("{id}_line"))
        .legend(Legend::default())
        .height(280.0)
        .x_axis_label("Period")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (col, country) in panel.countries().iter().enumerate() {
                let points: PlotPoints = panel
                    .column(col)
                    .zip(xs.iter())
                    .filter_map(|(v, &x)| v.map(|y| [x, y]))
                    .collect();

                let line = Line::new(points)
                    .name(country)
                    .color(colors.color_for(country))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// "Last 2022", or "Last (mixed periods)" when countries contribute
/// values from different periods.
fn cross_section_title(prefix: &str, cs: &CrossSection) -> String {
    match cs.period() {
        Some(period) => format!("{prefix} {period}"),
        None => format!("{prefix} (mixed periods)"),
    }
}

fn bar_chart(ui: &mut Ui, id: &str, prefix: &str, cs: &CrossSection, colors: &ColorMap) {
    if cs.is_empty() {
        return;
    }
    let title = cross_section_title(prefix, cs);
    ui.strong(&title);

    let bars: Vec<Bar> = cs
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| {
            Bar::new(i as f64, e.value)
                .name(format!("{} ({})", e.country, e.period))
                .fill(colors.color_for(&e.country))
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(220.0)
        .allow_scroll(false)
        .show_x(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(title));
        });
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

fn pie_title(prefix: &str, proportions: &Proportions) -> String {
    let mut periods: Vec<&str> = proportions
        .slices()
        .iter()
        .map(|s| s.period.as_str())
        .collect();
    periods.dedup();
    match periods.as_slice() {
        [single] => format!("{prefix} {single}"),
        _ => format!("{prefix} (mixed periods)"),
    }
}

fn pie_chart(ui: &mut Ui, title: &str, proportions: &Proportions, colors: &ColorMap) {
    ui.vertical(|ui: &mut Ui| {
        ui.strong(title);
        let size = 240.0;
        let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = size * 0.45;
        let at = |angle: f32, r: f32| Pos2::new(center.x + r * angle.cos(), center.y + r * angle.sin());

        // Counter-clockwise from twelve o'clock.
        let mut start = -FRAC_PI_2;
        for slice in proportions.slices() {
            let sweep = slice.share as f32 * TAU;
            let color = colors.color_for(&slice.country);
            let steps = ((sweep / TAU) * 90.0).ceil().max(1.0) as usize;
            for k in 0..steps {
                let a0 = start - sweep * k as f32 / steps as f32;
                let a1 = start - sweep * (k + 1) as f32 / steps as f32;
                painter.add(egui::Shape::convex_polygon(
                    vec![center, at(a0, radius), at(a1, radius)],
                    color,
                    Stroke::NONE,
                ));
            }
            let mid = start - sweep / 2.0;
            painter.text(
                at(mid, radius * 0.65),
                Align2::CENTER_CENTER,
                format!("{}\n{:.1}%", slice.country, slice.share * 100.0),
                FontId::proportional(11.0),
                Color32::BLACK,
            );
            start -= sweep;
        }
    });
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, panel: &Panel) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(60.0))
        .columns(Column::auto().at_least(80.0), panel.width())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Period");
            });
            for country in panel.countries() {
                header.col(|ui| {
                    ui.strong(country);
                });
            }
        })
        .body(|mut body| {
            for (row, period) in panel.periods().iter().enumerate() {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(period.as_str());
                    });
                    for value in panel.row(row) {
                        table_row.col(|ui| {
                            match value {
                                Some(v) => ui.label(format!("{v:.2}")),
                                None => ui.weak("–"),
                            };
                        });
                    }
                });
            }
        });
}
