//! Country boundary ingestion for the choropleth and country-click filter.
//!
//! Input is a GeoJSON `FeatureCollection` of `Polygon` / `MultiPolygon`
//! features. Rings are `[lng, lat]` positions as GeoJSON specifies.
//!
//! Ordering contract:
//! - Countries keep the feature order of the source document; every
//!   "first containing country" lookup depends on it.

use std::fmt;

use foundation::LatLng;
use geo::{BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable country key used by counts, the URL `country` parameter and
/// country-click selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryId(pub String);

impl CountryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country's areal geometry. Points on a boundary count as inside, so a
/// place on a shared border goes to whichever country comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl Country {
    pub fn new(id: CountryId, name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let bounds = geometry.bounding_rect();
        Self {
            id,
            name: name.into(),
            geometry,
            bounds,
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        let coord = Coord { x: p.lng, y: p.lat };
        let Some(bounds) = self.bounds else {
            return false;
        };
        bounds.intersects(&coord) && self.geometry.iter().any(|poly| poly.intersects(&coord))
    }
}

#[derive(Debug)]
pub enum CountrySetError {
    Json(String),
    NotAFeatureCollection,
}

impl fmt::Display for CountrySetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountrySetError::Json(msg) => write!(f, "country data is not valid JSON: {msg}"),
            CountrySetError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for CountrySetError {}

/// Ordered country polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountrySet {
    countries: Vec<Country>,
}

impl CountrySet {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, CountrySetError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| CountrySetError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    /// Features without a usable id or with non-areal geometry are skipped.
    pub fn from_geojson_value(value: &Value) -> Result<Self, CountrySetError> {
        let obj = value
            .as_object()
            .ok_or(CountrySetError::NotAFeatureCollection)?;
        if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
            return Err(CountrySetError::NotAFeatureCollection);
        }
        let features = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(CountrySetError::NotAFeatureCollection)?;

        let countries = features.iter().filter_map(parse_country).collect();
        Ok(Self { countries })
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Country> + '_ {
        self.countries.iter()
    }

    pub fn get(&self, id: &CountryId) -> Option<&Country> {
        self.countries.iter().find(|c| &c.id == id)
    }

    /// First country (in source order) whose polygons contain `p`.
    pub fn locate(&self, p: LatLng) -> Option<&Country> {
        self.countries.iter().find(|c| c.contains(p))
    }
}

fn parse_country(feature: &Value) -> Option<Country> {
    let obj = feature.as_object()?;
    if obj.get("type").and_then(|v| v.as_str()) != Some("Feature") {
        return None;
    }
    let empty = Map::new();
    let props = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .unwrap_or(&empty);

    let id = feature_id(obj.get("id"))
        .or_else(|| first_string(props, &["ISO_A3", "iso_a3", "ADM0_A3", "id"]))?;
    let name = first_string(props, &["ADMIN", "name", "NAME"]).unwrap_or_else(|| id.clone());

    let geometry = parse_areal_geometry(obj.get("geometry")?)?;
    if geometry.0.is_empty() {
        return None;
    }
    Some(Country::new(CountryId(id), name, geometry))
}

fn feature_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| feature_id(props.get(*k)))
}

fn parse_areal_geometry(value: &Value) -> Option<MultiPolygon<f64>> {
    let obj = value.as_object()?;
    let coords = obj.get("coordinates")?;
    let polygons = match obj.get("type")?.as_str()? {
        "Polygon" => vec![parse_polygon(coords)?],
        "MultiPolygon" => coords
            .as_array()?
            .iter()
            .map(parse_polygon)
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(MultiPolygon::new(polygons))
}

/// Outer ring followed by holes; open rings are closed by `Polygon::new`.
fn parse_polygon(coords: &Value) -> Option<Polygon<f64>> {
    let mut rings = coords
        .as_array()?
        .iter()
        .map(parse_ring)
        .collect::<Option<Vec<_>>>()?
        .into_iter();
    let exterior = rings.next().filter(|outer| outer.0.len() >= 3)?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(coords: &Value) -> Option<LineString<f64>> {
    coords
        .as_array()?
        .iter()
        .map(|pos| {
            let arr = pos.as_array()?;
            let lng = arr.first()?.as_f64()?;
            let lat = arr.get(1)?.as_f64()?;
            Some(Coord { x: lng, y: lat })
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

#[cfg(test)]
mod tests {
    use super::{CountryId, CountrySet, CountrySetError};
    use foundation::LatLng;

    const COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "ISO_A3": "ISL", "ADMIN": "Iceland" },
                "geometry": { "type": "Polygon", "coordinates": [
                    [[-25, 63], [-13, 63], [-13, 67], [-25, 67], [-25, 63]]
                ] }
            },
            {
                "type": "Feature",
                "id": "RNG",
                "properties": { "name": "Ringland" },
                "geometry": { "type": "Polygon", "coordinates": [
                    [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                    [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "iso_a3": "ARC" },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[20, 0], [22, 0], [22, 2], [20, 2], [20, 0]]],
                    [[[30, 0], [32, 0], [32, 2], [30, 2], [30, 0]]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "name": "no id" },
                "geometry": { "type": "Polygon", "coordinates": [
                    [[50, 0], [52, 0], [52, 2], [50, 0]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "ISO_A3": "PTS" },
                "geometry": { "type": "Point", "coordinates": [1, 1] }
            }
        ]
    }"#;

    #[test]
    fn parses_ids_names_and_skips_unusable_features() {
        let set = CountrySet::from_geojson_str(COUNTRIES).unwrap();
        let ids: Vec<&str> = set.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ISL", "RNG", "ARC"]);
        assert_eq!(set.get(&CountryId::new("ISL")).unwrap().name, "Iceland");
        assert_eq!(set.get(&CountryId::new("RNG")).unwrap().name, "Ringland");
        // Falls back to the id when no name property exists.
        assert_eq!(set.get(&CountryId::new("ARC")).unwrap().name, "ARC");
    }

    #[test]
    fn holes_are_excluded() {
        let set = CountrySet::from_geojson_str(COUNTRIES).unwrap();
        let ring = set.get(&CountryId::new("RNG")).unwrap();
        assert!(ring.contains(LatLng::new(2.0, 2.0)));
        assert!(!ring.contains(LatLng::new(5.0, 5.0)));
        assert!(!ring.contains(LatLng::new(11.0, 2.0)));
    }

    #[test]
    fn multipolygon_parts_each_count() {
        let set = CountrySet::from_geojson_str(COUNTRIES).unwrap();
        let arc = set.get(&CountryId::new("ARC")).unwrap();
        assert!(arc.contains(LatLng::new(1.0, 21.0)));
        assert!(arc.contains(LatLng::new(1.0, 31.0)));
        assert!(!arc.contains(LatLng::new(1.0, 26.0)));
    }

    #[test]
    fn locate_returns_containing_country() {
        let set = CountrySet::from_geojson_str(COUNTRIES).unwrap();
        let hit = set.locate(LatLng::new(64.1, -21.9)).unwrap();
        assert_eq!(hit.id, CountryId::new("ISL"));
        assert!(set.locate(LatLng::new(-77.8, 166.7)).is_none());
    }

    #[test]
    fn boundary_points_are_inside_and_shared_borders_go_to_the_first_country() {
        let set = CountrySet::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": "WEST", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 40], [10, 40], [10, 50], [0, 50]]]}},
                {"type": "Feature", "id": "EAST", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[10, 40], [20, 40], [20, 50], [10, 50], [10, 40]]]}}
            ]}"#,
        )
        .unwrap();
        let west = set.get(&CountryId::new("WEST")).unwrap();
        assert!(west.contains(LatLng::new(45.0, 0.0)));
        assert!(west.contains(LatLng::new(45.0, 10.0)));
        assert!(west.contains(LatLng::new(50.0, 5.0)));

        let hit = set.locate(LatLng::new(45.0, 10.0)).unwrap();
        assert_eq!(hit.id, CountryId::new("WEST"));
        let hit = set.locate(LatLng::new(45.0, 10.5)).unwrap();
        assert_eq!(hit.id, CountryId::new("EAST"));
    }

    #[test]
    fn rejects_non_feature_collections() {
        assert!(matches!(
            CountrySet::from_geojson_str(r#"{"type": "Feature"}"#),
            Err(CountrySetError::NotAFeatureCollection)
        ));
        assert!(matches!(
            CountrySet::from_geojson_str("not json"),
            Err(CountrySetError::Json(_))
        ));
    }
}
