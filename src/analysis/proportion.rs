use serde::Serialize;

use super::extremes::{CrossSection, Entry, Extremes};
use crate::data::model::Period;
use crate::notice::{NoticeKind, Notices};

/// One wedge of a proportion view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub country: String,
    pub value: f64,
    pub period: Period,
    /// Fraction of the total, in `(0, 1]`.
    pub share: f64,
}

/// Strictly positive values of a cross-section as shares of their sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Proportions {
    slices: Vec<Slice>,
    total: f64,
}

impl Proportions {
    fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let entries: Vec<&Entry> = entries.into_iter().collect();
        let total: f64 = entries.iter().map(|e| e.value).sum();
        let slices = entries
            .into_iter()
            .map(|e| Slice {
                country: e.country.clone(),
                value: e.value,
                period: e.period.clone(),
                share: e.value / total,
            })
            .collect();
        Proportions { slices, total }
    }

    /// Proportions of the `requested` countries within one cross-section of
    /// `indicator`.
    ///
    /// A country absent from the cross-section or with a non-positive value
    /// is left out with a notice.
    pub fn from_cross_section(
        indicator: &str,
        cross_section: &CrossSection,
        requested: &[String],
        notices: &mut Notices,
    ) -> Self {
        let mut included = Vec::new();
        for country in requested {
            match cross_section.get(country) {
                Some(e) if e.value > 0.0 => included.push(e),
                Some(e) => notices.push(NoticeKind::NonPositive {
                    indicator: indicator.to_string(),
                    country: country.clone(),
                    value: e.value,
                }),
                None => notices.push(NoticeKind::AbsentFromCrossSection {
                    indicator: indicator.to_string(),
                    country: country.clone(),
                }),
            }
        }
        Self::from_entries(included)
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// First and last proportion views over the same set of countries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PieComparison {
    pub first: Proportions,
    pub last: Proportions,
}

impl PieComparison {
    /// A country takes part only when it is present and positive in both the
    /// first and the last cross-section, so both pies carry the same labels.
    /// Each excluded country is reported once.
    pub fn from_extremes(
        indicator: &str,
        extremes: &Extremes,
        requested: &[String],
        notices: &mut Notices,
    ) -> Self {
        let mut first = Vec::new();
        let mut last = Vec::new();
        for country in requested {
            match (extremes.first.get(country), extremes.last.get(country)) {
                (Some(f), Some(l)) if f.value > 0.0 && l.value > 0.0 => {
                    first.push(f);
                    last.push(l);
                }
                (Some(f), Some(l)) => notices.push(NoticeKind::NonPositive {
                    indicator: indicator.to_string(),
                    country: country.clone(),
                    value: if l.value > 0.0 { f.value } else { l.value },
                }),
                _ => notices.push(NoticeKind::AbsentFromCrossSection {
                    indicator: indicator.to_string(),
                    country: country.clone(),
                }),
            }
        }
        PieComparison {
            first: Proportions::from_entries(first),
            last: Proportions::from_entries(last),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.last.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::analysis::extremes::extremes;
    use crate::analysis::panel::Panel;

    const EXPORTS: &str = "NE.EXP.GNFS.ZS";

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn two_period_extremes(columns: Vec<(&str, Vec<Option<f64>>)>) -> Extremes {
        let panel = Panel::from_columns(
            EXPORTS,
            vec!["2022".into(), "2021".into()],
            columns.into_iter().map(|(c, v)| (c.to_string(), v)).collect(),
        );
        extremes(&panel, &mut Notices::new())
    }

    #[test]
    fn non_positive_value_is_excluded_with_notice() {
        let ex = two_period_extremes(vec![
            ("A", vec![Some(12.0), Some(11.0)]),
            ("B", vec![Some(-3.0), Some(-2.0)]),
        ]);
        let mut notices = Notices::new();
        let pie = Proportions::from_cross_section(EXPORTS, &ex.last, &ids(&["A", "B"]), &mut notices);

        assert_eq!(pie.len(), 1);
        assert_eq!(pie.slices()[0].country, "A");
        assert_relative_eq!(pie.slices()[0].share, 1.0);
        assert_eq!(
            notices.count(|k| matches!(
                k,
                NoticeKind::NonPositive { indicator, country, .. }
                    if indicator == EXPORTS && country == "B"
            )),
            1
        );
    }

    #[test]
    fn shares_sum_to_one() {
        let ex = two_period_extremes(vec![
            ("A", vec![Some(30.0), Some(10.0)]),
            ("B", vec![Some(10.0), Some(30.0)]),
        ]);
        let pie = Proportions::from_cross_section(EXPORTS, &ex.last, &ids(&["A", "B"]), &mut Notices::new());
        assert_relative_eq!(pie.total(), 40.0);
        assert_relative_eq!(pie.slices()[0].share, 0.75);
        assert_relative_eq!(pie.slices().iter().map(|s| s.share).sum::<f64>(), 1.0);
    }

    #[test]
    fn comparison_requires_positive_in_both_periods() {
        let ex = two_period_extremes(vec![
            ("A", vec![Some(5.0), Some(4.0)]),
            ("B", vec![Some(3.0), Some(-1.0)]),
            ("C", vec![Some(2.0), Some(1.0)]),
        ]);
        let mut notices = Notices::new();
        let pies = PieComparison::from_extremes(EXPORTS, &ex, &ids(&["A", "B", "C", "D"]), &mut notices);

        let labels = |p: &Proportions| p.slices().iter().map(|s| s.country.clone()).collect::<Vec<_>>();
        assert_eq!(labels(&pies.first), vec!["A", "C"]);
        assert_eq!(labels(&pies.last), vec!["A", "C"]);
        assert_eq!(pies.first.slices()[0].period, Period::from("2021"));
        assert_eq!(notices.len(), 2);
        assert_eq!(
            notices.count(|k| matches!(k, NoticeKind::NonPositive { value, .. } if *value == -1.0)),
            1
        );
        assert_eq!(
            notices.count(|k| matches!(k, NoticeKind::AbsentFromCrossSection { country, .. } if country == "D")),
            1
        );
    }
}
