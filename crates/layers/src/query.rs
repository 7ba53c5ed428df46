use std::collections::BTreeSet;

use catalog::{PlaceCatalog, PlaceId, Region, classify};
use formats::{CountryId, CountrySet};
use foundation::math::haversine_km;
use foundation::{GeoBounds, LatLng};

/// Every user-controlled visibility criterion at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub active_regions: BTreeSet<Region>,
    pub query: String,
    pub viewport_bounds: Option<GeoBounds>,
    pub reference_point: Option<LatLng>,
    pub country: Option<CountryId>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            active_regions: Region::ALL.into_iter().collect(),
            query: String::new(),
            viewport_bounds: None,
            reference_point: None,
            country: None,
        }
    }
}

impl FilterState {
    /// Query as it is matched: trimmed and lowercased.
    pub fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisiblePlace {
    pub id: PlaceId,
    pub region: Region,
    /// Great-circle distance from the reference point, when one is set.
    pub distance_km: Option<f64>,
}

/// Projects the catalog through `state`.
///
/// Ordering contract:
/// - With a reference point, ascending distance; equal distances keep
///   catalog order.
/// - Otherwise catalog order.
///
/// An empty region set selects nothing. A selected country that is missing
/// from `countries` (or with no polygons loaded at all) does not filter.
pub fn compute_visible(
    catalog: &PlaceCatalog,
    state: &FilterState,
    countries: Option<&CountrySet>,
) -> Vec<VisiblePlace> {
    if state.active_regions.is_empty() {
        return Vec::new();
    }

    let needle = state.normalized_query();
    let country = state
        .country
        .as_ref()
        .and_then(|id| countries.and_then(|set| set.get(id)));

    let mut out: Vec<VisiblePlace> = Vec::new();
    for (id, place) in catalog.iter() {
        let region = classify(place.lat, place.lng);
        if !state.active_regions.contains(&region) {
            continue;
        }
        if !needle.is_empty() && !place.name.to_lowercase().contains(&needle) {
            continue;
        }
        let position = place.position();
        if let Some(bounds) = state.viewport_bounds
            && !bounds.contains(position)
        {
            continue;
        }
        if let Some(c) = country
            && !c.contains(position)
        {
            continue;
        }

        out.push(VisiblePlace {
            id,
            region,
            distance_km: state.reference_point.map(|r| haversine_km(r, position)),
        });
    }

    if state.reference_point.is_some() {
        // `sort_by` is stable, which keeps ties in catalog order.
        out.sort_by(|a, b| {
            a.distance_km
                .unwrap_or(0.0)
                .total_cmp(&b.distance_km.unwrap_or(0.0))
        });
    }

    out
}
