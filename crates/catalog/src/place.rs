use foundation::LatLng;
use serde::{Deserialize, Serialize};

use crate::region::{Region, classify};

/// Stable identity of a place: its position in catalog order.
///
/// Names are not unique, so focus and popup handling key on this instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub u32);

impl PlaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn region(&self) -> Region {
        classify(self.lat, self.lng)
    }
}
