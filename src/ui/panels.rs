use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_econ::data::selection::Group;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Economic Indicators");
    ui.separator();

    let Some(file) = &state.catalog else {
        ui.label("No catalog loaded.");
        ui.label("File → Open catalog…");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let sources = file.catalog.sources().to_vec();
    let country_names: Vec<String> = file
        .catalog
        .countries()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let regions: Vec<String> = file.catalog.regions().into_iter().collect();
    let income_levels: Vec<String> = file.catalog.income_levels().into_iter().collect();
    let indicators = state.source_indicators().to_vec();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Source selector ----
            ui.strong("Source");
            let current = state.selected_source.clone().unwrap_or_default();
            let current_name = sources
                .iter()
                .find(|s| s.id == current)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            egui::ComboBox::from_id_salt("source")
                .selected_text(current_name)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for source in &sources {
                        if ui
                            .selectable_label(current == source.id, &source.name)
                            .clicked()
                        {
                            state.select_source(&source.id);
                        }
                    }
                });
            ui.separator();

            // ---- Indicators ----
            let header = format!(
                "Indicators  ({}/{})",
                state.selected_indicators.len(),
                indicators.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("indicators")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for indicator in &indicators {
                        let mut checked = state.selected_indicators.contains(&indicator.id);
                        let response = ui.checkbox(&mut checked, indicator.name.as_str());
                        if response.changed() {
                            state.toggle_indicator(&indicator.id);
                        }
                        if !indicator.source_note.is_empty() {
                            response.on_hover_text(indicator.source_note.as_str());
                        }
                    }
                });
            ui.separator();

            // ---- Country groups (collapsible) ----
            group_widget(ui, state, Group::Country, "Countries", &country_names);
            group_widget(ui, state, Group::Region, "Regions", &regions);
            group_widget(ui, state, Group::IncomeLevel, "Income levels", &income_levels);
            ui.separator();

            // ---- Presentation toggles ----
            ui.strong("Display");
            let mut charts = state.charts;
            ui.checkbox(&mut charts.line, "Line Chart");
            ui.checkbox(&mut charts.bar, "Bar Chart");
            ui.checkbox(&mut charts.pie, "Pie Chart");
            ui.checkbox(&mut charts.table, "Display Data");
            state.set_charts(charts);
            ui.checkbox(&mut state.show_warnings, "Show warnings");
        });

    // Re-run the pipeline after any selection change.
    state.refresh();
}

/// A checkbox list for one selection group with All / None buttons.
fn group_widget(ui: &mut Ui, state: &mut AppState, group: Group, title: &str, values: &[String]) {
    let n_selected = state.criterion.group(group).len();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(group);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(group);
                }
            });

            for value in values {
                let mut checked = state.criterion.group(group).contains(value);
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    state.toggle(group, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open catalog…").clicked() {
                open_catalog_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open observations…").clicked() {
                open_observations_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let has_report = state.report.is_some();
            if ui
                .add_enabled(has_report, egui::Button::new("Export report…"))
                .clicked()
            {
                export_report_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_report, egui::Button::new("Export panels as CSV…"))
                .clicked()
            {
                export_panels_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(file) = &state.catalog {
            ui.label(format!(
                "{} countries, {} sources",
                file.catalog.countries().len(),
                file.catalog.sources().len()
            ));
        }
        if let Some(source) = &state.observations {
            ui.separator();
            ui.label(format!("data: {}", source.path.display()));
        }
        if let Some(report) = &state.report {
            ui.separator();
            ui.label(format!("{} countries selected", report.countries.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_catalog_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open catalog")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_catalog(&path);
    }
}

fn open_observations_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open observations")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.set_observations(path);
    }
}

fn export_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export report")
        .add_filter("JSON", &["json"])
        .set_file_name("report.json")
        .save_file();

    if let Some(path) = file {
        state.export_report(&path);
    }
}

fn export_panels_dialog(state: &mut AppState) {
    if let Some(dir) = rfd::FileDialog::new()
        .set_title("Export panels")
        .pick_folder()
    {
        state.export_panels(&dir);
    }
}
