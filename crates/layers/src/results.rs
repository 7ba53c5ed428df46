use catalog::{PlaceCatalog, PlaceId, Region};
use serde::Serialize;

use crate::query::VisiblePlace;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub id: PlaceId,
    pub name: String,
    pub region: Region,
    pub distance_km: Option<f64>,
}

impl ResultEntry {
    /// "Name · Region" plus a rounded distance when known.
    pub fn label(&self) -> String {
        match self.distance_km {
            Some(d) => format!("{} · {} · {}", self.name, self.region, format_distance(d)),
            None => format!("{} · {}", self.name, self.region),
        }
    }
}

/// Sidebar results panel for the visible set, in visible order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsList {
    pub entries: Vec<ResultEntry>,
}

impl ResultsList {
    pub fn build(catalog: &PlaceCatalog, visible: &[VisiblePlace]) -> Self {
        let entries = visible
            .iter()
            .filter_map(|v| {
                let place = catalog.get(v.id)?;
                Some(ResultEntry {
                    id: v.id,
                    name: place.name.clone(),
                    region: v.region,
                    distance_km: v.distance_km,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn summary(&self) -> String {
        match self.entries.len() {
            0 => "No places match".to_string(),
            1 => "1 place".to_string(),
            n => format!("{n} places"),
        }
    }
}

pub fn format_distance(km: f64) -> String {
    if km < 10.0 {
        format!("{km:.1} km")
    } else {
        format!("{:.0} km", km.round())
    }
}
