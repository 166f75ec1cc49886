use std::collections::BTreeMap;

use super::model::Period;

/// One raw cell: (indicator, country, period) → value or missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub indicator: String,
    pub country: String,
    pub period: Period,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(indicator: &str, country: &str, period: &str, value: Option<f64>) -> Self {
        Observation {
            indicator: indicator.to_string(),
            country: country.to_string(),
            period: Period::new(period),
            value,
        }
    }
}

type Series = Vec<(Period, Option<f64>)>;

// ---------------------------------------------------------------------------
// ObservationTable – raw fetch result, read-only once built
// ---------------------------------------------------------------------------

/// Observations grouped by indicator and country.
///
/// Each country series keeps the period order in which the source delivered
/// it. NaN is stored as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    series: BTreeMap<String, BTreeMap<String, Series>>,
    len: usize,
}

impl ObservationTable {
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut table = ObservationTable::default();
        for obs in observations {
            table.insert(obs);
        }
        table
    }

    /// Add an observation. A repeated (indicator, country, period) key keeps
    /// the latest value.
    pub fn insert(&mut self, obs: Observation) {
        let value = obs.value.filter(|v| !v.is_nan());
        let series = self
            .series
            .entry(obs.indicator)
            .or_default()
            .entry(obs.country)
            .or_default();
        match series.iter_mut().find(|(p, _)| *p == obs.period) {
            Some(slot) => slot.1 = value,
            None => {
                series.push((obs.period, value));
                self.len += 1;
            }
        }
    }

    /// A country's series for one indicator, `None` when the source returned
    /// no rows for it.
    pub fn series(&self, indicator: &str, country: &str) -> Option<&[(Period, Option<f64>)]> {
        self.series
            .get(indicator)?
            .get(country)
            .map(|s| s.as_slice())
    }

    pub fn has_indicator(&self, indicator: &str) -> bool {
        self.series.contains_key(indicator)
    }

    pub fn indicator_ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn country_ids(&self, indicator: &str) -> impl Iterator<Item = &str> {
        self.series
            .get(indicator)
            .into_iter()
            .flat_map(|countries| countries.keys().map(|k| k.as_str()))
    }

    /// Restrict the table to the given indicators and countries.
    pub fn select(&self, indicators: &[String], countries: &[String]) -> ObservationTable {
        let mut out = ObservationTable::default();
        for (indicator, by_country) in &self.series {
            if !indicators.contains(indicator) {
                continue;
            }
            for (country, series) in by_country {
                if !countries.contains(country) {
                    continue;
                }
                out.len += series.len();
                out.series
                    .entry(indicator.clone())
                    .or_default()
                    .insert(country.clone(), series.clone());
            }
        }
        out
    }

    /// Number of stored (indicator, country, period) cells.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
