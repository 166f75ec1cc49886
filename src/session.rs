use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::analysis::{build_panel, extremes, Extremes, Panel, PieComparison};
use crate::data::model::{Catalog, Indicator};
use crate::data::observation::ObservationTable;
use crate::data::selection::{resolve, ResolvedCountrySet, SelectionCriterion};
use crate::data::source::{FetchError, ObservationSource};
use crate::notice::{NoticeKind, Notices};

// ---------------------------------------------------------------------------
// Fetch memoization
// ---------------------------------------------------------------------------

/// Sorted indicator and country identifiers of one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    indicators: Vec<String>,
    countries: Vec<String>,
}

impl FetchKey {
    pub fn new(indicators: &[Indicator], countries: &ResolvedCountrySet) -> Self {
        let mut ids: Vec<String> = indicators.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        FetchKey {
            indicators: ids,
            countries: countries.sorted(),
        }
    }
}

/// Tables already fetched this session, oldest evicted first.
#[derive(Debug, Clone)]
pub struct FetchCache {
    capacity: usize,
    entries: VecDeque<(FetchKey, ObservationTable)>,
}

impl FetchCache {
    pub fn new(capacity: usize) -> Self {
        FetchCache {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &FetchKey) -> Option<&ObservationTable> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    /// Return the cached table for `key` or fetch it. A failed fetch clears
    /// the whole cache so the next request starts from scratch.
    pub fn get_or_fetch(
        &mut self,
        key: FetchKey,
        source: &dyn ObservationSource,
    ) -> Result<&ObservationTable, FetchError> {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            log::debug!("Fetch cache hit for {} countries", key.countries.len());
            return Ok(&self.entries[pos].1);
        }

        log::debug!("Fetch cache miss for {} countries", key.countries.len());
        let table = match source.fetch(&key.indicators, &key.countries) {
            Ok(table) => table,
            Err(e) => {
                self.clear();
                return Err(e);
            }
        };
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, table));
        let last = self.entries.len() - 1;
        Ok(&self.entries[last].1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Requests and reports
// ---------------------------------------------------------------------------

/// What the user picked: indicators plus a country criterion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRequest {
    pub indicators: Vec<Indicator>,
    pub criterion: SelectionCriterion,
    /// Derive the pie comparison (and its proportion notices).
    pub pies: bool,
}

/// Everything derived for one indicator.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorAnalysis {
    pub indicator: Indicator,
    pub panel: Panel,
    pub extremes: Extremes,
    /// Only when requested, for panels with more than one country and
    /// usable extremes.
    pub pies: Option<PieComparison>,
}

/// Result of one pipeline run, handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub countries: ResolvedCountrySet,
    pub analyses: Vec<IndicatorAnalysis>,
    pub notices: Notices,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-user pipeline state: resolve → fetch → build → extract.
#[derive(Debug, Clone)]
pub struct Session {
    cache: FetchCache,
}

impl Session {
    pub fn new(cache_capacity: usize) -> Self {
        Session {
            cache: FetchCache::new(cache_capacity),
        }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Forget fetched tables, e.g. after switching observation files.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    pub fn run(
        &mut self,
        catalog: &Catalog,
        request: &AnalysisRequest,
        source: &dyn ObservationSource,
    ) -> Report {
        let countries = resolve(&request.criterion, catalog);
        let mut notices = Notices::new();

        if countries.is_empty() || request.indicators.is_empty() {
            return Report {
                countries,
                ..Report::default()
            };
        }

        let key = FetchKey::new(&request.indicators, &countries);
        let table = match self.cache.get_or_fetch(key, source) {
            Ok(table) => table,
            Err(e) => {
                notices.push(NoticeKind::FetchFailed {
                    countries: countries.ids().to_vec(),
                    reason: e.to_string(),
                });
                return Report {
                    countries,
                    analyses: Vec::new(),
                    notices,
                };
            }
        };

        let mut analyses = Vec::new();
        let mut seen = HashSet::new();
        for indicator in &request.indicators {
            if !seen.insert(indicator.id.as_str()) {
                continue;
            }
            if !table.has_indicator(&indicator.id) {
                notices.push(NoticeKind::MissingIndicator {
                    indicator: indicator.id.clone(),
                });
                continue;
            }

            let panel = build_panel(table, &indicator.id, &countries, &mut notices);
            let extremes = extremes(&panel, &mut notices);
            let pies = (request.pies && panel.width() > 1 && !extremes.is_empty()).then(|| {
                PieComparison::from_extremes(&indicator.id, &extremes, panel.countries(), &mut notices)
            });

            analyses.push(IndicatorAnalysis {
                indicator: indicator.clone(),
                panel,
                extremes,
                pies,
            });
        }

        log::info!(
            "Analysed {} indicators for {} countries ({} notices)",
            analyses.len(),
            countries.len(),
            notices.len()
        );
        Report {
            countries,
            analyses,
            notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::analysis::Strategy;
    use crate::data::model::fixtures::{catalog, indicator};
    use crate::data::observation::Observation;
    use crate::data::source::TableSource;

    struct CountingSource {
        fetches: Cell<usize>,
        fail: Cell<bool>,
        inner: TableSource,
    }

    impl CountingSource {
        fn new(observations: Vec<Observation>) -> Self {
            CountingSource {
                fetches: Cell::new(0),
                fail: Cell::new(false),
                inner: TableSource {
                    table: ObservationTable::from_observations(observations),
                },
            }
        }
    }

    impl ObservationSource for CountingSource {
        fn fetch(
            &self,
            indicator_ids: &[String],
            country_ids: &[String],
        ) -> Result<ObservationTable, FetchError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail.get() {
                return Err(FetchError::Unavailable("connection reset".into()));
            }
            self.inner.fetch(indicator_ids, country_ids)
        }
    }

    fn gdp() -> Indicator {
        indicator("NY.GDP.MKTP.CD", "GDP (current US$)", "2")
    }

    fn observations() -> Vec<Observation> {
        vec![
            Observation::new("NY.GDP.MKTP.CD", "DEU", "2022", Some(12.0)),
            Observation::new("NY.GDP.MKTP.CD", "DEU", "2021", None),
            Observation::new("NY.GDP.MKTP.CD", "DEU", "2020", Some(10.0)),
            Observation::new("NY.GDP.MKTP.CD", "FRA", "2022", Some(22.0)),
            Observation::new("NY.GDP.MKTP.CD", "FRA", "2021", Some(21.0)),
            Observation::new("NY.GDP.MKTP.CD", "FRA", "2020", Some(20.0)),
        ]
    }

    fn europe(indicators: Vec<Indicator>) -> AnalysisRequest {
        AnalysisRequest {
            indicators,
            criterion: SelectionCriterion {
                regions: ["Europe & Central Asia".to_string()].into(),
                ..Default::default()
            },
            pies: true,
        }
    }

    #[test]
    fn full_pipeline_for_one_indicator() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let report = session.run(&catalog(), &europe(vec![gdp()]), &source);

        assert_eq!(report.countries.ids(), &["DEU", "FRA"]);
        let analysis = &report.analyses[0];
        assert_eq!(analysis.extremes.strategy, Strategy::CompleteRows);
        assert_eq!(analysis.extremes.last.value("DEU"), Some(12.0));
        assert_eq!(analysis.extremes.first.value("FRA"), Some(20.0));
        let pies = analysis.pies.as_ref().unwrap();
        assert_eq!(pies.last.len(), 2);
        assert!(report.notices.is_empty());
    }

    #[test]
    fn empty_selection_skips_fetch() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let request = AnalysisRequest {
            indicators: vec![gdp()],
            criterion: SelectionCriterion::default(),
            pies: true,
        };
        let report = session.run(&catalog(), &request, &source);
        assert!(report.is_empty());
        assert!(report.notices.is_empty());
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn identical_request_is_served_from_cache() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let cat = catalog();
        session.run(&cat, &europe(vec![gdp()]), &source);
        session.run(&cat, &europe(vec![gdp()]), &source);
        assert_eq!(source.fetches.get(), 1);

        let mut wider = europe(vec![gdp()]);
        wider.criterion.names.insert("Brazil".into());
        let report = session.run(&cat, &wider, &source);
        assert_eq!(source.fetches.get(), 2);
        assert_eq!(
            report
                .notices
                .count(|k| matches!(k, NoticeKind::MissingCountry { country, .. } if country == "BRA")),
            1
        );
    }

    #[test]
    fn fetch_failure_reports_once_and_resets_cache() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let cat = catalog();
        session.run(&cat, &europe(vec![gdp()]), &source);
        assert_eq!(session.cache().len(), 1);

        source.fail.set(true);
        let mut other = europe(vec![gdp()]);
        other.criterion.names.insert("India".into());
        let report = session.run(&cat, &other, &source);
        assert!(report.is_empty());
        assert_eq!(report.notices.len(), 1);
        assert_eq!(
            report
                .notices
                .count(|k| matches!(k, NoticeKind::FetchFailed { .. })),
            1
        );
        assert!(session.cache().is_empty());

        source.fail.set(false);
        session.run(&cat, &europe(vec![gdp()]), &source);
        assert_eq!(source.fetches.get(), 3);
    }

    #[test]
    fn missing_indicator_does_not_stop_the_others() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let pop = indicator("SP.POP.TOTL", "Population, total", "2");
        let report = session.run(&catalog(), &europe(vec![pop, gdp()]), &source);

        assert_eq!(report.analyses.len(), 1);
        assert_eq!(report.analyses[0].indicator.id, "NY.GDP.MKTP.CD");
        assert_eq!(
            report
                .notices
                .count(|k| matches!(k, NoticeKind::MissingIndicator { indicator } if indicator == "SP.POP.TOTL")),
            1
        );
    }

    #[test]
    fn single_country_has_no_pie() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let request = AnalysisRequest {
            indicators: vec![gdp()],
            criterion: SelectionCriterion {
                names: ["Germany".to_string()].into(),
                ..Default::default()
            },
            pies: true,
        };
        let report = session.run(&catalog(), &request, &source);
        let analysis = &report.analyses[0];
        assert_eq!(analysis.extremes.strategy, Strategy::SingleSeries);
        assert!(analysis.pies.is_none());
    }

    #[test]
    fn proportion_notices_only_when_pies_are_requested() {
        let mut obs = observations();
        obs.push(Observation::new("NY.GDP.MKTP.CD", "DEU", "2022", Some(-1.0)));
        let source = CountingSource::new(obs);
        let mut session = Session::new(4);
        let cat = catalog();
        let non_positive = |report: &Report| {
            report
                .notices
                .count(|k| matches!(k, NoticeKind::NonPositive { country, .. } if country == "DEU"))
        };

        let mut lines_only = europe(vec![gdp()]);
        lines_only.pies = false;
        let report = session.run(&cat, &lines_only, &source);
        assert!(report.analyses[0].pies.is_none());
        assert_eq!(non_positive(&report), 0);

        let report = session.run(&cat, &europe(vec![gdp()]), &source);
        assert_eq!(non_positive(&report), 1);
        assert_eq!(
            report.notices.count(|k| matches!(
                k,
                NoticeKind::NonPositive { indicator, .. } if indicator == "NY.GDP.MKTP.CD"
            )),
            1
        );
    }

    #[test]
    fn repeated_indicator_is_analysed_once() {
        let source = CountingSource::new(observations());
        let mut session = Session::new(4);
        let mut request = europe(vec![gdp(), gdp()]);
        request.criterion.names.insert("Brazil".into());
        let report = session.run(&catalog(), &request, &source);

        assert_eq!(report.analyses.len(), 1);
        assert_eq!(
            report
                .notices
                .count(|k| matches!(k, NoticeKind::MissingCountry { country, .. } if country == "BRA")),
            1
        );
    }

    #[test]
    fn cache_evicts_oldest_entry() {
        let source = CountingSource::new(observations());
        let mut cache = FetchCache::new(2);
        let key = |names: &[&str]| {
            FetchKey::new(&[gdp()], &ResolvedCountrySet::from_ids(names.iter().copied()))
        };
        cache.get_or_fetch(key(&["DEU"]), &source).unwrap();
        cache.get_or_fetch(key(&["FRA"]), &source).unwrap();
        cache.get_or_fetch(key(&["USA"]), &source).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(&["DEU"])).is_none());
        assert!(cache.get(&key(&["FRA"])).is_some());
    }

    #[test]
    fn key_ignores_selection_order() {
        let a = FetchKey::new(&[gdp()], &ResolvedCountrySet::from_ids(["FRA", "DEU"]));
        let b = FetchKey::new(&[gdp()], &ResolvedCountrySet::from_ids(["DEU", "FRA"]));
        assert_eq!(a, b);
    }
}
