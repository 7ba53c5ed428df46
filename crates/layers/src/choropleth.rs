use std::collections::BTreeMap;

use catalog::PlaceCatalog;
use formats::{CountryId, CountrySet};
use foundation::LatLng;
use serde::Serialize;

use crate::query::VisiblePlace;
use crate::symbology::{FillBucket, FillStyle};

/// Which place set feeds the country counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ChoroplethMode {
    /// Counts follow the current filtered set.
    #[default]
    Filtered,
    /// Counts cover the whole catalog regardless of filters.
    Catalog,
}

/// Counts points per country.
///
/// Each point is credited to the first country (in set order) that contains
/// it and never to a second one; points outside every country are not
/// counted. Countries with no points are absent from the map.
pub fn count_by_country<I>(points: I, countries: &CountrySet) -> BTreeMap<CountryId, usize>
where
    I: IntoIterator<Item = LatLng>,
{
    let mut counts: BTreeMap<CountryId, usize> = BTreeMap::new();
    for p in points {
        if let Some(country) = countries.locate(p) {
            *counts.entry(country.id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethEntry {
    pub id: CountryId,
    pub name: String,
    pub count: usize,
    pub bucket: FillBucket,
}

impl ChoroplethEntry {
    pub fn style(&self) -> FillStyle {
        self.bucket.style()
    }
}

/// Fill state for every country, in country-set order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choropleth {
    pub mode: ChoroplethMode,
    pub entries: Vec<ChoroplethEntry>,
}

impl Choropleth {
    pub fn build(
        catalog: &PlaceCatalog,
        visible: &[VisiblePlace],
        countries: &CountrySet,
        mode: ChoroplethMode,
    ) -> Self {
        let counts = match mode {
            ChoroplethMode::Filtered => count_by_country(
                visible
                    .iter()
                    .filter_map(|v| catalog.get(v.id))
                    .map(|p| p.position()),
                countries,
            ),
            ChoroplethMode::Catalog => {
                count_by_country(catalog.iter().map(|(_, p)| p.position()), countries)
            }
        };

        let entries = countries
            .iter()
            .map(|c| {
                let count = counts.get(&c.id).copied().unwrap_or(0);
                ChoroplethEntry {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    count,
                    bucket: FillBucket::for_count(count),
                }
            })
            .collect();

        Self { mode, entries }
    }

    pub fn count(&self, id: &CountryId) -> usize {
        self.entries
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}
