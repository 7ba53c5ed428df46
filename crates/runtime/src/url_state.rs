//! Shareable URL state.
//!
//! Parameters:
//! - `q`: trimmed search text, omitted when empty
//! - `regions`: comma-joined region names in `Region::ALL` order; always
//!   written, empty when no region is active
//! - `lat` / `lng`: map center, 4 decimals
//! - `z`: integer zoom
//! - `within`: `1` when results are restricted to the viewport, else omitted
//! - `country`: selected country id, omitted when none
//!
//! Parsing applies onto a base state: missing or invalid fields keep the
//! base value. An absent `regions` keeps the base regions, while a present
//! but empty `regions=` selects none, so a written URL always reads back to
//! the same state.

use std::collections::BTreeSet;

use catalog::Region;
use formats::CountryId;
use foundation::LatLng;
use serde::Serialize;
use url::form_urlencoded;

pub const MAX_ZOOM: u8 = 18;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

impl MapView {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.min(MAX_ZOOM),
        }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(LatLng::new(20.0, 0.0), 2)
    }
}

/// The part of session state that round-trips through the query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlState {
    pub query: String,
    pub regions: BTreeSet<Region>,
    pub view: MapView,
    pub within_viewport: bool,
    pub country: Option<CountryId>,
}

impl Default for UrlState {
    fn default() -> Self {
        Self {
            query: String::new(),
            regions: Region::ALL.into_iter().collect(),
            view: MapView::default(),
            within_viewport: false,
            country: None,
        }
    }
}

/// Query string without the leading `?`.
pub fn to_query_string(state: &UrlState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());

    let q = state.query.trim();
    if !q.is_empty() {
        out.append_pair("q", q);
    }

    let regions = Region::ALL
        .into_iter()
        .filter(|r| state.regions.contains(r))
        .map(Region::name)
        .collect::<Vec<_>>()
        .join(",");
    out.append_pair("regions", &regions);

    out.append_pair("lat", &format!("{:.4}", state.view.center.lat));
    out.append_pair("lng", &format!("{:.4}", state.view.center.lng));
    out.append_pair("z", &state.view.zoom.to_string());

    if state.within_viewport {
        out.append_pair("within", "1");
    }
    if let Some(country) = &state.country {
        out.append_pair("country", country.as_str());
    }

    out.finish()
}

/// Reads `query` (with or without a leading `?`) on top of `base`.
pub fn parse_query_string(query: &str, base: &UrlState) -> UrlState {
    let mut state = base.clone();
    let query = query.trim().trim_start_matches('?');

    let mut lat: Option<f64> = None;
    let mut lng: Option<f64> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "q" => state.query = value.trim().to_string(),
            "regions" => {
                if let Some(regions) = parse_regions(&value) {
                    state.regions = regions;
                }
            }
            "lat" => lat = parse_finite(&value).filter(|v| (-90.0..=90.0).contains(v)),
            "lng" => lng = parse_finite(&value).filter(|v| (-180.0..=180.0).contains(v)),
            "z" => {
                if let Ok(z) = value.trim().parse::<u8>()
                    && z <= MAX_ZOOM
                {
                    state.view.zoom = z;
                }
            }
            "within" => state.within_viewport = matches!(value.trim(), "1" | "true"),
            "country" => {
                let id = value.trim();
                state.country = (!id.is_empty()).then(|| CountryId::new(id));
            }
            _ => {}
        }
    }

    if let (Some(lat), Some(lng)) = (lat, lng) {
        state.view.center = LatLng::new(lat, lng);
    }

    state
}

/// `None` means "invalid, keep the base value".
fn parse_regions(value: &str) -> Option<BTreeSet<Region>> {
    if value.trim().is_empty() {
        return Some(BTreeSet::new());
    }
    let regions: BTreeSet<Region> = value
        .split(',')
        .filter_map(|name| name.parse::<Region>().ok())
        .collect();
    (!regions.is_empty()).then_some(regions)
}

fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
