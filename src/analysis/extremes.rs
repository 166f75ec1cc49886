use std::fmt;

use serde::Serialize;

use super::panel::Panel;
use crate::data::model::Period;
use crate::notice::{NoticeKind, Notices};

// ---------------------------------------------------------------------------
// CrossSection – one value per country
// ---------------------------------------------------------------------------

/// A country's contribution to a cross-section, tagged with its own period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub country: String,
    pub value: f64,
    pub period: Period,
}

/// A snapshot of values across countries.
///
/// Every entry carries the period it was taken from; when the snapshot was
/// assembled per country the periods may differ.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossSection {
    entries: Vec<Entry>,
}

impl CrossSection {
    fn from_row(panel: &Panel, row: usize) -> Self {
        let period = &panel.periods()[row];
        let entries = panel
            .countries()
            .iter()
            .enumerate()
            .filter_map(|(col, country)| {
                panel.value(row, col).map(|value| Entry {
                    country: country.clone(),
                    value,
                    period: period.clone(),
                })
            })
            .collect();
        CrossSection { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, country: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.country == country)
    }

    pub fn value(&self, country: &str) -> Option<f64> {
        self.get(country).map(|e| e.value)
    }

    /// The period shared by every entry; `None` when empty or mixed.
    pub fn period(&self) -> Option<&Period> {
        let first = &self.entries.first()?.period;
        self.entries
            .iter()
            .all(|e| e.period == *first)
            .then_some(first)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

/// Which fallback produced the cross-sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// Most recent and earliest periods complete for every country.
    CompleteRows,
    /// Countries with a complete history only.
    CompleteColumns,
    /// Each country's own latest and earliest valid values.
    PerCountry,
    /// One country: its own latest and earliest valid values.
    SingleSeries,
    /// No valid value anywhere.
    Unavailable,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CompleteRows => write!(f, "complete periods"),
            Strategy::CompleteColumns => write!(f, "countries with complete history"),
            Strategy::PerCountry => write!(f, "each country's own first and last values"),
            Strategy::SingleSeries => write!(f, "the single series"),
            Strategy::Unavailable => write!(f, "no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    /// Earliest valid cross-section.
    pub first: CrossSection,
    /// Most recent valid cross-section.
    pub last: CrossSection,
    pub strategy: Strategy,
}

impl Extremes {
    fn unavailable() -> Self {
        Extremes {
            first: CrossSection::default(),
            last: CrossSection::default(),
            strategy: Strategy::Unavailable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.last.is_empty()
    }
}

/// Determine the first and last valid cross-sections of a panel.
///
/// Fallback order, each step only when the previous left nothing:
/// 1. drop periods with any missing cell, take the top and bottom rows;
/// 2. drop countries with any missing cell, take the top and bottom rows;
/// 3. take each country's own latest and earliest valid values.
///
/// A one-column panel goes straight to its own latest and earliest values.
/// A panel without any value yields two empty cross-sections and a
/// `NoUsableData` notice.
pub fn extremes(panel: &Panel, notices: &mut Notices) -> Extremes {
    if !panel.has_values() {
        notices.push(NoticeKind::NoUsableData {
            indicator: panel.indicator().to_string(),
        });
        return Extremes::unavailable();
    }

    if panel.width() == 1 {
        return per_country(panel, Strategy::SingleSeries);
    }

    let rows = panel.drop_incomplete_rows();
    if !rows.is_empty() {
        return top_and_bottom(&rows, Strategy::CompleteRows);
    }

    let columns = panel.drop_incomplete_columns();
    let result = if !columns.is_empty() {
        top_and_bottom(&columns, Strategy::CompleteColumns)
    } else {
        per_country(panel, Strategy::PerCountry)
    };
    notices.push(NoticeKind::PartialCoverage {
        indicator: panel.indicator().to_string(),
        strategy: result.strategy.to_string(),
    });
    result
}

fn top_and_bottom(panel: &Panel, strategy: Strategy) -> Extremes {
    Extremes {
        last: CrossSection::from_row(panel, 0),
        first: CrossSection::from_row(panel, panel.height() - 1),
        strategy,
    }
}

fn per_country(panel: &Panel, strategy: Strategy) -> Extremes {
    let periods = panel.periods();
    let mut first = Vec::new();
    let mut last = Vec::new();

    for (col, country) in panel.countries().iter().enumerate() {
        let valid = || {
            panel
                .column(col)
                .enumerate()
                .filter_map(|(row, v)| v.map(|value| (row, value)))
        };
        let entry = |(row, value): (usize, f64)| Entry {
            country: country.clone(),
            value,
            period: periods[row].clone(),
        };
        // Rows run newest first.
        if let Some(hit) = valid().next() {
            last.push(entry(hit));
        }
        if let Some(hit) = valid().last() {
            first.push(entry(hit));
        }
    }

    Extremes {
        first: CrossSection { entries: first },
        last: CrossSection { entries: last },
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(columns: Vec<(&str, Vec<Option<f64>>)>) -> Panel {
        Panel::from_columns(
            "NY.GDP.MKTP.CD",
            vec!["2022".into(), "2021".into(), "2020".into()],
            columns
                .into_iter()
                .map(|(c, v)| (c.to_string(), v))
                .collect(),
        )
    }

    fn values(cs: &CrossSection) -> Vec<(&str, f64, &str)> {
        cs.entries()
            .iter()
            .map(|e| (e.country.as_str(), e.value, e.period.as_str()))
            .collect()
    }

    #[test]
    fn complete_panel_uses_top_and_bottom_rows() {
        let mut notices = Notices::new();
        let p = panel(vec![
            ("A", vec![Some(3.0), Some(2.0), Some(1.0)]),
            ("B", vec![Some(30.0), Some(20.0), Some(10.0)]),
        ]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(ex.strategy, Strategy::CompleteRows);
        assert_eq!(values(&ex.last), vec![("A", 3.0, "2022"), ("B", 30.0, "2022")]);
        assert_eq!(values(&ex.first), vec![("A", 1.0, "2020"), ("B", 10.0, "2020")]);
        assert!(notices.is_empty());
    }

    #[test]
    fn gap_in_one_country_drops_that_period() {
        let mut notices = Notices::new();
        let p = panel(vec![
            ("A", vec![Some(12.0), None, Some(10.0)]),
            ("B", vec![Some(22.0), Some(21.0), Some(20.0)]),
        ]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(ex.strategy, Strategy::CompleteRows);
        assert_eq!(values(&ex.last), vec![("A", 12.0, "2022"), ("B", 22.0, "2022")]);
        assert_eq!(values(&ex.first), vec![("A", 10.0, "2020"), ("B", 20.0, "2020")]);
        assert_eq!(ex.last.period(), Some(&Period::from("2022")));
    }

    #[test]
    fn country_missing_everywhere_falls_back_to_complete_columns() {
        let mut notices = Notices::new();
        let p = panel(vec![
            ("A", vec![None, None, None]),
            ("B", vec![Some(22.0), Some(21.0), Some(20.0)]),
            ("C", vec![Some(5.0), Some(4.0), Some(3.0)]),
        ]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(ex.strategy, Strategy::CompleteColumns);
        assert_eq!(values(&ex.last), vec![("B", 22.0, "2022"), ("C", 5.0, "2022")]);
        assert_eq!(values(&ex.first), vec![("B", 20.0, "2020"), ("C", 3.0, "2020")]);
        assert_eq!(
            notices.count(|k| matches!(k, NoticeKind::PartialCoverage { .. })),
            1
        );
    }

    #[test]
    fn staggered_gaps_fall_back_to_per_country_periods() {
        let mut notices = Notices::new();
        let p = panel(vec![
            ("A", vec![None, Some(11.0), Some(10.0)]),
            ("B", vec![Some(22.0), None, None]),
        ]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(ex.strategy, Strategy::PerCountry);
        assert_eq!(values(&ex.last), vec![("A", 11.0, "2021"), ("B", 22.0, "2022")]);
        assert_eq!(values(&ex.first), vec![("A", 10.0, "2020"), ("B", 22.0, "2022")]);
        assert_eq!(ex.last.period(), None);
    }

    #[test]
    fn single_country_uses_its_own_valid_extremes() {
        let mut notices = Notices::new();
        let p = panel(vec![("A", vec![Some(12.0), None, Some(10.0)])]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(ex.strategy, Strategy::SingleSeries);
        assert_eq!(values(&ex.last), vec![("A", 12.0, "2022")]);
        assert_eq!(values(&ex.first), vec![("A", 10.0, "2020")]);
        assert!(notices.is_empty());
    }

    #[test]
    fn single_country_with_missing_edges() {
        let mut notices = Notices::new();
        let p = panel(vec![("A", vec![None, Some(7.0), None])]);
        let ex = extremes(&p, &mut notices);
        assert_eq!(values(&ex.last), vec![("A", 7.0, "2021")]);
        assert_eq!(values(&ex.first), vec![("A", 7.0, "2021")]);
    }

    #[test]
    fn all_missing_panel_is_empty_with_one_notice() {
        let mut notices = Notices::new();
        let p = panel(vec![("A", vec![None, None, None]), ("B", vec![None, None, None])]);
        let ex = extremes(&p, &mut notices);
        assert!(ex.is_empty());
        assert_eq!(ex.strategy, Strategy::Unavailable);
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices.count(|k| matches!(k, NoticeKind::NoUsableData { .. })),
            1
        );
    }

    #[test]
    fn panel_without_columns_is_unavailable() {
        let mut notices = Notices::new();
        let ex = extremes(&panel(vec![]), &mut notices);
        assert!(ex.is_empty());
        assert_eq!(notices.len(), 1);
    }
}
