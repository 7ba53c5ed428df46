pub mod place;
pub mod region;

pub use place::*;
pub use region::*;

use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "failed to read catalog {}: {source}", path.display())
            }
            CatalogError::Parse(msg) => write!(f, "invalid place catalog: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            CatalogError::Parse(_) => None,
        }
    }
}

/// Immutable, ordered collection of places loaded once per session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceCatalog {
    places: Vec<Place>,
}

impl PlaceCatalog {
    /// Records with non-finite coordinates are dropped; everything else is
    /// kept as given, in order.
    pub fn from_places(places: Vec<Place>) -> Self {
        let places = places
            .into_iter()
            .filter(|p| p.lat.is_finite() && p.lng.is_finite())
            .collect();
        Self { places }
    }

    /// Parses a JSON array of `{ "name", "lat", "lng" }` records.
    pub fn from_json_str(payload: &str) -> Result<Self, CatalogError> {
        let places: Vec<Place> =
            serde_json::from_str(payload).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Self::from_places(places))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    /// Places with their ids, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, &Place)> + '_ {
        self.places
            .iter()
            .enumerate()
            .map(|(i, p)| (PlaceId(i as u32), p))
    }

    /// First `limit` places by name, ignoring case.
    pub fn suggestions(&self, limit: usize) -> Vec<PlaceId> {
        let mut keyed: Vec<(String, &str, PlaceId)> = self
            .iter()
            .map(|(id, place)| (place.name.to_lowercase(), place.name.as_str(), id))
            .collect();
        // Case-insensitive first; the raw name and then the id break ties.
        keyed.sort();
        keyed.into_iter().take(limit).map(|(_, _, id)| id).collect()
    }
}
