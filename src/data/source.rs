use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use super::loader::{load_observations, CatalogFile};
use super::model::{Catalog, CatalogError, Country, Indicator, Source};
use super::observation::ObservationTable;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a catalog or observation source. Callers treat every variant
/// as transient: report it, reset fetch bookkeeping, retry on the next change.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read observations from {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("unknown source '{0}'")]
    UnknownSource(String),
    #[error("invalid catalog data: {0}")]
    Invalid(#[from] CatalogError),
    #[error("observation source unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Static reference data for the session.
pub trait CatalogSource {
    fn list_sources(&self) -> Result<Vec<Source>, FetchError>;
    fn list_countries(&self) -> Result<Vec<Country>, FetchError>;
    fn list_indicators(&self, source_id: &str) -> Result<Vec<Indicator>, FetchError>;
}

/// Raw observations for a set of indicators and countries.
pub trait ObservationSource {
    fn fetch(
        &self,
        indicator_ids: &[String],
        country_ids: &[String],
    ) -> Result<ObservationTable, FetchError>;
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl CatalogSource for CatalogFile {
    fn list_sources(&self) -> Result<Vec<Source>, FetchError> {
        Ok(self.catalog.sources().to_vec())
    }

    fn list_countries(&self) -> Result<Vec<Country>, FetchError> {
        Ok(self.catalog.countries().to_vec())
    }

    fn list_indicators(&self, source_id: &str) -> Result<Vec<Indicator>, FetchError> {
        if self.catalog.source(source_id).is_none() {
            return Err(FetchError::UnknownSource(source_id.to_string()));
        }
        Ok(self
            .indicators
            .iter()
            .filter(|i| i.source_id() == source_id)
            .cloned()
            .collect())
    }
}

/// Serves fetches from a table already held in memory.
#[derive(Debug, Clone, Default)]
pub struct TableSource {
    pub table: ObservationTable,
}

impl ObservationSource for TableSource {
    fn fetch(
        &self,
        indicator_ids: &[String],
        country_ids: &[String],
    ) -> Result<ObservationTable, FetchError> {
        Ok(self.table.select(indicator_ids, country_ids))
    }
}

/// Re-reads an observation file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl ObservationSource for FileSource {
    fn fetch(
        &self,
        indicator_ids: &[String],
        country_ids: &[String],
    ) -> Result<ObservationTable, FetchError> {
        let table = load_observations(&self.path).map_err(|e| FetchError::Read {
            path: self.path.clone(),
            reason: format!("{e:#}"),
        })?;
        Ok(table.select(indicator_ids, country_ids))
    }
}

// ---------------------------------------------------------------------------
// Per-session indicator cache
// ---------------------------------------------------------------------------

/// Indicators loaded lazily per source and kept for the session.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCache {
    by_source: HashMap<String, Vec<Indicator>>,
}

impl IndicatorCache {
    /// Indicators of `source_id`, loading and validating them on first use.
    pub fn get_or_load(
        &mut self,
        catalog: &Catalog,
        source_id: &str,
        source: &dyn CatalogSource,
    ) -> Result<&[Indicator], FetchError> {
        if !self.by_source.contains_key(source_id) {
            let list = source.list_indicators(source_id)?;
            catalog.validate_indicators(&list)?;
            log::debug!("Cached {} indicators for source {source_id}", list.len());
            self.by_source.insert(source_id.to_string(), list);
        }
        Ok(self
            .by_source
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn get(&self, source_id: &str) -> Option<&[Indicator]> {
        self.by_source.get(source_id).map(Vec::as_slice)
    }

    /// Look an indicator up across every cached source.
    pub fn find(&self, indicator_id: &str) -> Option<&Indicator> {
        self.by_source
            .values()
            .flat_map(|list| list.iter())
            .find(|i| i.id == indicator_id)
    }

    pub fn clear(&mut self) {
        self.by_source.clear();
    }
}
