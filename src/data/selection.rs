use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Catalog, Country};

// ---------------------------------------------------------------------------
// Selection criterion: explicit names plus bulk groupings
// ---------------------------------------------------------------------------

/// Which checkbox group a selected value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Country,
    Region,
    IncomeLevel,
}

/// Countries chosen by name, by region and by income level.
///
/// Empty in every group means "nothing selected", not "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriterion {
    pub names: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub income_levels: BTreeSet<String>,
}

impl SelectionCriterion {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.regions.is_empty() && self.income_levels.is_empty()
    }

    pub fn group(&self, group: Group) -> &BTreeSet<String> {
        match group {
            Group::Country => &self.names,
            Group::Region => &self.regions,
            Group::IncomeLevel => &self.income_levels,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut BTreeSet<String> {
        match group {
            Group::Country => &mut self.names,
            Group::Region => &mut self.regions,
            Group::IncomeLevel => &mut self.income_levels,
        }
    }

    /// Toggle a single value in a group.
    pub fn toggle(&mut self, group: Group, value: &str) {
        let selected = self.group_mut(group);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Select every value of a group.
    pub fn select_all<'a>(&mut self, group: Group, values: impl IntoIterator<Item = &'a String>) {
        self.group_mut(group).extend(values.into_iter().cloned());
    }

    /// Deselect every value of a group.
    pub fn select_none(&mut self, group: Group) {
        self.group_mut(group).clear();
    }

    fn matches(&self, country: &Country) -> bool {
        self.names.contains(&country.name)
            || self.regions.contains(&country.region.name)
            || self.income_levels.contains(&country.income_level.name)
    }
}

// ---------------------------------------------------------------------------
// Resolved country set
// ---------------------------------------------------------------------------

/// Deduplicated country identifiers, every one present in the catalog.
///
/// Members are kept in catalog order so that equal criteria always give the
/// same column order downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResolvedCountrySet {
    ids: Vec<String>,
}

impl ResolvedCountrySet {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        ResolvedCountrySet { ids: out }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|c| c == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted identifiers, usable as a cache key.
    pub fn sorted(&self) -> Vec<String> {
        let mut ids = self.ids.clone();
        ids.sort();
        ids
    }
}

/// Resolve a criterion into the union of explicit name matches, region
/// members and income-level members.
///
/// Unknown names, regions or levels contribute nothing.
pub fn resolve(criterion: &SelectionCriterion, catalog: &Catalog) -> ResolvedCountrySet {
    if criterion.is_empty() {
        return ResolvedCountrySet::default();
    }
    ResolvedCountrySet {
        ids: catalog
            .countries()
            .iter()
            .filter(|c| criterion.matches(c))
            .map(|c| c.id.clone())
            .collect(),
    }
}
