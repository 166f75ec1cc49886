use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::data::model::Period;
use crate::data::observation::ObservationTable;
use crate::data::selection::ResolvedCountrySet;
use crate::notice::{NoticeKind, Notices};

// ---------------------------------------------------------------------------
// Panel – periods × countries for one indicator
// ---------------------------------------------------------------------------

/// A period × country matrix of values for one indicator.
///
/// Rows run from the most recent period down to the earliest, ordered by
/// sorting the period labels as strings. A single
/// country is just a one-column panel; there is no separate series shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    indicator: String,
    periods: Vec<Period>,
    countries: Vec<String>,
    /// Row-major: `cells[row][col]`.
    cells: Vec<Vec<Option<f64>>>,
}

impl Panel {
    /// Assemble a panel from per-country columns over the given periods.
    ///
    /// Columns shorter than `periods` are padded with missing cells.
    pub fn from_columns(
        indicator: &str,
        periods: Vec<Period>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Self {
        let cells = (0..periods.len())
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, col)| col.get(row).copied().flatten())
                    .collect()
            })
            .collect();
        Panel {
            indicator: indicator.to_string(),
            periods,
            countries: columns.into_iter().map(|(c, _)| c).collect(),
            cells,
        }
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn height(&self) -> usize {
        self.periods.len()
    }

    pub fn width(&self) -> usize {
        self.countries.len()
    }

    /// No rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() || self.countries.is_empty()
    }

    pub fn column_index(&self, country: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == country)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    pub fn row(&self, row: usize) -> &[Option<f64>] {
        self.cells.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-to-bottom (most recent first) cells of one country.
    pub fn column(&self, col: usize) -> impl DoubleEndedIterator<Item = Option<f64>> + '_ {
        self.cells.iter().map(move |r| r.get(col).copied().flatten())
    }

    /// Whether any cell holds a value.
    pub fn has_values(&self) -> bool {
        self.cells.iter().flatten().any(Option::is_some)
    }

    /// Keep only periods with a value for every country.
    pub fn drop_incomplete_rows(&self) -> Panel {
        let keep: Vec<usize> = (0..self.height())
            .filter(|&r| self.cells[r].iter().all(Option::is_some))
            .collect();
        Panel {
            indicator: self.indicator.clone(),
            periods: keep.iter().map(|&r| self.periods[r].clone()).collect(),
            countries: self.countries.clone(),
            cells: keep.iter().map(|&r| self.cells[r].clone()).collect(),
        }
    }

    /// Keep only countries with a value in every period.
    pub fn drop_incomplete_columns(&self) -> Panel {
        let keep: Vec<usize> = (0..self.width())
            .filter(|&c| self.column(c).all(|v| v.is_some()))
            .collect();
        Panel {
            indicator: self.indicator.clone(),
            periods: self.periods.clone(),
            countries: keep.iter().map(|&c| self.countries[c].clone()).collect(),
            cells: self
                .cells
                .iter()
                .map(|row| keep.iter().map(|&c| row[c]).collect())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Reshape the raw table into a panel for one indicator.
///
/// Columns follow the order of `countries`; a requested country with no rows
/// in the table is left out and reported once. Rows are the union of all
/// delivered periods sorted descending by label, not the delivery order;
/// for `YYYY`, `YYYYQn` and `YYYYMmm` labels that is most recent first.
pub fn build_panel(
    observations: &ObservationTable,
    indicator_id: &str,
    countries: &ResolvedCountrySet,
    notices: &mut Notices,
) -> Panel {
    let mut present: Vec<(&str, HashMap<&Period, Option<f64>>)> = Vec::new();
    let mut periods: BTreeSet<&Period> = BTreeSet::new();

    for country in countries.ids() {
        match observations.series(indicator_id, country) {
            Some(series) => {
                periods.extend(series.iter().map(|(p, _)| p));
                present.push((country.as_str(), series.iter().map(|(p, v)| (p, *v)).collect()));
            }
            None => notices.push(NoticeKind::MissingCountry {
                indicator: indicator_id.to_string(),
                country: country.clone(),
            }),
        }
    }

    let periods: Vec<Period> = periods.into_iter().rev().cloned().collect();
    let cells = periods
        .iter()
        .map(|p| {
            present
                .iter()
                .map(|(_, by_period)| by_period.get(p).copied().flatten())
                .collect()
        })
        .collect();

    log::debug!(
        "Built panel for {indicator_id}: {} periods x {} countries",
        periods.len(),
        present.len()
    );
    Panel {
        indicator: indicator_id.to_string(),
        periods,
        countries: present.into_iter().map(|(c, _)| c.to_string()).collect(),
        cells,
    }
}
