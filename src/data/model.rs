use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Period – a row label of a panel
// ---------------------------------------------------------------------------

/// A period label as published by the source ("2021", "2021Q3", "2021M07").
///
/// Labels of one frequency order chronologically under plain string ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    pub fn new(label: impl Into<String>) -> Self {
        Period(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading calendar year, used as the x coordinate when plotting.
    pub fn year(&self) -> Option<f64> {
        self.0.get(..4)?.parse::<i32>().ok().map(f64::from)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Period {
    fn from(s: &str) -> Self {
        Period(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// A named grouping attribute (region, income level, owning source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(rename = "value", alias = "name")]
    pub name: String,
}

impl Category {
    pub fn new(id: &str, name: &str) -> Self {
        Category {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// A statistical source (dataset) grouping indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
}

/// A measurable quantity published by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    #[serde(rename = "sourceNote", default)]
    pub source_note: String,
    pub source: Category,
}

impl Indicator {
    pub fn source_id(&self) -> &str {
        &self.source.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub region: Category,
    #[serde(rename = "incomeLevel")]
    pub income_level: Category,
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("{kind} '{name}' has an empty identifier")]
    EmptyId { kind: &'static str, name: String },
    #[error("duplicate {kind} identifier '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("indicator '{indicator}' references unknown source '{source_id}'")]
    UnknownSource { indicator: String, source_id: String },
}

fn check_ids<'a>(
    kind: &'static str,
    records: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for (id, name) in records {
        if id.trim().is_empty() {
            return Err(CatalogError::EmptyId {
                kind,
                name: name.to_string(),
            });
        }
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog – static reference data for the session
// ---------------------------------------------------------------------------

/// Validated sources and countries. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    sources: Vec<Source>,
    countries: Vec<Country>,
}

impl Catalog {
    pub fn new(sources: Vec<Source>, countries: Vec<Country>) -> Result<Self, CatalogError> {
        check_ids("source", sources.iter().map(|s| (s.id.as_str(), s.name.as_str())))?;
        check_ids(
            "country",
            countries.iter().map(|c| (c.id.as_str(), c.name.as_str())),
        )?;
        Ok(Catalog { sources, countries })
    }

    /// Validate a batch of indicators loaded for one source.
    pub fn validate_indicators(&self, indicators: &[Indicator]) -> Result<(), CatalogError> {
        check_ids(
            "indicator",
            indicators.iter().map(|i| (i.id.as_str(), i.name.as_str())),
        )?;
        for ind in indicators {
            if self.source(ind.source_id()).is_none() {
                return Err(CatalogError::UnknownSource {
                    indicator: ind.id.clone(),
                    source_id: ind.source.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn source(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn source_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn country(&self, id: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    pub fn country_by_name(&self, name: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.name == name)
    }

    /// Sorted unique region names, for bulk-selection widgets.
    pub fn regions(&self) -> BTreeSet<String> {
        self.countries.iter().map(|c| c.region.name.clone()).collect()
    }

    /// Sorted unique income level names.
    pub fn income_levels(&self) -> BTreeSet<String> {
        self.countries
            .iter()
            .map(|c| c.income_level.name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.sources.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn country(id: &str, name: &str, region: &str, income: &str) -> Country {
        Country {
            id: id.to_string(),
            name: name.to_string(),
            region: Category::new(&region[..3.min(region.len())].to_uppercase(), region),
            income_level: Category::new(&income[..3.min(income.len())].to_uppercase(), income),
        }
    }

    pub fn indicator(id: &str, name: &str, source: &str) -> Indicator {
        Indicator {
            id: id.to_string(),
            name: name.to_string(),
            source_note: format!("{name} description"),
            source: Category::new(source, "World Development Indicators"),
        }
    }

    pub fn catalog() -> Catalog {
        Catalog::new(
            vec![Source {
                id: "2".into(),
                name: "World Development Indicators".into(),
            }],
            vec![
                country("DEU", "Germany", "Europe & Central Asia", "High income"),
                country("FRA", "France", "Europe & Central Asia", "High income"),
                country("BRA", "Brazil", "Latin America & Caribbean", "Upper middle income"),
                country("IND", "India", "South Asia", "Lower middle income"),
                country("NGA", "Nigeria", "Sub-Saharan Africa", "Lower middle income"),
                country("USA", "United States", "North America", "High income"),
            ],
        )
        .expect("fixture catalog is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn rejects_duplicate_country_ids() {
        let err = Catalog::new(
            vec![],
            vec![
                country("DEU", "Germany", "Europe", "High income"),
                country("DEU", "Deutschland", "Europe", "High income"),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateId {
                kind: "country",
                id: "DEU".into()
            }
        );
    }

    #[test]
    fn rejects_blank_source_id() {
        let err = Catalog::new(
            vec![Source {
                id: " ".into(),
                name: "Doing Business".into(),
            }],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyId { kind: "source", .. }));
    }

    #[test]
    fn indicators_must_reference_known_source() {
        let cat = catalog();
        assert!(cat
            .validate_indicators(&[indicator("NY.GDP.MKTP.CD", "GDP", "2")])
            .is_ok());
        let err = cat
            .validate_indicators(&[indicator("IC.BUS.EASE.XQ", "Ease", "1")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSource { .. }));
    }

    #[test]
    fn grouping_names_are_unique_and_sorted() {
        let cat = catalog();
        let incomes: Vec<String> = cat.income_levels().into_iter().collect();
        assert_eq!(
            incomes,
            vec!["High income", "Lower middle income", "Upper middle income"]
        );
        assert_eq!(cat.regions().len(), 5);
    }

    #[test]
    fn deserializes_world_bank_country_shape() {
        let json = r#"{
            "id": "KEN", "iso2Code": "KE", "name": "Kenya",
            "region": {"id": "SSF", "iso2code": "ZG", "value": "Sub-Saharan Africa "},
            "incomeLevel": {"id": "LMC", "iso2code": "XN", "value": "Lower middle income"},
            "capitalCity": "Nairobi"
        }"#;
        let c: Country = serde_json::from_str(json).unwrap();
        assert_eq!(c.income_level.id, "LMC");
        assert_eq!(c.region.name, "Sub-Saharan Africa ");
    }

    #[test]
    fn period_year_prefix() {
        assert_eq!(Period::from("2021Q3").year(), Some(2021.0));
        assert_eq!(Period::from("n/a").year(), None);
    }
}
