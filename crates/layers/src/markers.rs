use catalog::{PlaceCatalog, PlaceId, Region};
use foundation::LatLng;
use serde::Serialize;

use crate::query::VisiblePlace;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: PlaceId,
    pub name: String,
    pub position: LatLng,
    pub region: Region,
}

impl Marker {
    pub fn popup_title(&self) -> &str {
        &self.name
    }

    pub fn popup_subtitle(&self) -> &'static str {
        self.region.name()
    }
}

/// Map markers for the visible set, in visible order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn build(catalog: &PlaceCatalog, visible: &[VisiblePlace]) -> Self {
        let markers = visible
            .iter()
            .filter_map(|v| {
                let place = catalog.get(v.id)?;
                Some(Marker {
                    id: v.id,
                    name: place.name.clone(),
                    position: place.position(),
                    region: v.region,
                })
            })
            .collect();
        Self { markers }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Looks a marker up by place id; duplicate names never collide.
    pub fn find(&self, id: PlaceId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerLayer;
    use crate::query::{FilterState, compute_visible};
    use catalog::{Place, PlaceCatalog, PlaceId, Region};

    #[test]
    fn duplicate_names_resolve_by_id() {
        let catalog = PlaceCatalog::from_places(vec![
            Place::new("Mount Olympus", 40.08, 22.35),
            Place::new("Mount Olympus", 47.8, -123.71),
        ]);
        let visible = compute_visible(&catalog, &FilterState::default(), None);
        let layer = MarkerLayer::build(&catalog, &visible);
        assert_eq!(layer.len(), 2);
        let us = layer.find(PlaceId(1)).unwrap();
        assert_eq!(us.region, Region::NorthAmerica);
        assert_eq!(us.popup_subtitle(), "North America");
        assert_eq!(layer.find(PlaceId(0)).unwrap().popup_subtitle(), "Europe");
    }
}
