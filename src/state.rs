use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusty_econ::config::{ChartToggles, ViewerConfig};
use rusty_econ::data::export;
use rusty_econ::data::loader::{load_catalog, CatalogFile};
use rusty_econ::data::model::Indicator;
use rusty_econ::data::selection::{Group, SelectionCriterion};
use rusty_econ::data::source::{FileSource, IndicatorCache};
use rusty_econ::session::{AnalysisRequest, Report, Session};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded catalog (None until the user opens one).
    pub catalog: Option<CatalogFile>,

    /// Indicators per source, loaded on first selection.
    pub indicators: IndicatorCache,

    /// Observation file fetched from.
    pub observations: Option<FileSource>,

    pub selected_source: Option<String>,
    pub selected_indicators: BTreeSet<String>,
    pub criterion: SelectionCriterion,

    pub charts: ChartToggles,
    pub show_warnings: bool,

    /// Pipeline state, including the fetch cache.
    pub session: Session,

    /// Result of the latest run.
    pub report: Option<Report>,

    /// Country colours for the current report.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Selection changed since the last run.
    dirty: bool,
}

impl AppState {
    pub fn from_config(config: &ViewerConfig) -> Self {
        let mut state = Self {
            catalog: None,
            indicators: IndicatorCache::default(),
            observations: None,
            selected_source: None,
            selected_indicators: BTreeSet::new(),
            criterion: SelectionCriterion::default(),
            charts: config.charts,
            show_warnings: config.show_warnings,
            session: Session::new(config.fetch_cache_capacity),
            report: None,
            color_map: ColorMap::default(),
            status_message: None,
            dirty: false,
        };
        if let Some(path) = &config.catalog_path {
            state.open_catalog(path);
        }
        if let Some(path) = &config.observations_path {
            state.set_observations(path.clone());
        }
        state
    }

    /// Load a catalog file and reset every selection.
    pub fn open_catalog(&mut self, path: &Path) {
        match load_catalog(path) {
            Ok(file) => {
                let first_source = file.catalog.sources().first().map(|s| s.id.clone());
                self.catalog = Some(file);
                self.indicators.clear();
                self.selected_indicators.clear();
                self.criterion = SelectionCriterion::default();
                self.report = None;
                self.status_message = None;
                if let Some(id) = first_source {
                    self.select_source(&id);
                }
            }
            Err(e) => {
                log::error!("Failed to load catalog: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn set_observations(&mut self, path: PathBuf) {
        log::info!("Fetching observations from {}", path.display());
        self.observations = Some(FileSource { path });
        self.session.reset();
        self.dirty = true;
    }

    /// Switch source; its indicators are loaded on first use.
    pub fn select_source(&mut self, source_id: &str) {
        let Some(file) = &self.catalog else {
            return;
        };
        match self.indicators.get_or_load(&file.catalog, source_id, file) {
            Ok(_) => {
                self.selected_source = Some(source_id.to_string());
                self.selected_indicators.clear();
                self.dirty = true;
            }
            Err(e) => {
                log::error!("Failed to load indicators: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Indicators of the selected source.
    pub fn source_indicators(&self) -> &[Indicator] {
        self.selected_source
            .as_deref()
            .and_then(|id| self.indicators.get(id))
            .unwrap_or(&[])
    }

    pub fn toggle_indicator(&mut self, id: &str) {
        if !self.selected_indicators.remove(id) {
            self.selected_indicators.insert(id.to_string());
        }
        self.dirty = true;
    }

    /// Toggle a single value in a country selection group.
    pub fn toggle(&mut self, group: Group, value: &str) {
        self.criterion.toggle(group, value);
        self.dirty = true;
    }

    /// Select all values in a group.
    pub fn select_all(&mut self, group: Group) {
        let Some(file) = &self.catalog else {
            return;
        };
        let values: BTreeSet<String> = match group {
            Group::Country => file.catalog.countries().iter().map(|c| c.name.clone()).collect(),
            Group::Region => file.catalog.regions(),
            Group::IncomeLevel => file.catalog.income_levels(),
        };
        self.criterion.select_all(group, &values);
        self.dirty = true;
    }

    /// Deselect all values in a group.
    pub fn select_none(&mut self, group: Group) {
        self.criterion.select_none(group);
        self.dirty = true;
    }

    pub fn set_charts(&mut self, charts: ChartToggles) {
        if charts != self.charts {
            self.charts = charts;
            self.dirty = true;
        }
    }

    /// Re-run the pipeline after a selection change.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let (Some(file), Some(source)) = (&self.catalog, &self.observations) else {
            return;
        };
        let nothing_to_process = self.selected_indicators.is_empty()
            || self.criterion.is_empty()
            || !self.charts.any();
        if nothing_to_process {
            self.report = None;
            return;
        }

        let request = AnalysisRequest {
            indicators: self
                .selected_indicators
                .iter()
                .filter_map(|id| self.indicators.find(id).cloned())
                .collect(),
            criterion: self.criterion.clone(),
            pies: self.charts.pie,
        };
        let report = self.session.run(&file.catalog, &request, source);
        self.color_map = ColorMap::new(report.countries.ids());
        self.report = Some(report);
    }

    /// Write the current report as JSON.
    pub fn export_report(&mut self, path: &Path) {
        let result = match &self.report {
            Some(report) => export::write_report_json(path, report),
            None => Ok(()),
        };
        self.report_result(result);
    }

    /// Write one CSV per analysed indicator into `dir`.
    pub fn export_panels(&mut self, dir: &Path) {
        let result = (|| -> Result<()> {
            let Some(report) = &self.report else {
                return Ok(());
            };
            for analysis in &report.analyses {
                let name = format!("{}.csv", analysis.indicator.id);
                export::write_panel_csv(&dir.join(&name), &analysis.panel)
                    .with_context(|| format!("exporting {name}"))?;
            }
            Ok(())
        })();
        self.report_result(result);
    }

    fn report_result(&mut self, result: Result<()>) {
        if let Err(e) = result {
            log::error!("Export failed: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
