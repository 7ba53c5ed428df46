use crate::coord::LatLng;

/// Geographic bounding box in degrees, edges inclusive.
///
/// When `west > east` the box crosses the antimeridian and longitude
/// containment wraps through +/-180.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        GeoBounds {
            south,
            west,
            north,
            east,
        }
    }

    /// Box of `lat_span` x `lng_span` degrees centered on `center`.
    ///
    /// Latitude is clamped to the poles; longitude edges are wrapped so a box
    /// straddling 180 degrees crosses the antimeridian.
    pub fn from_center_span(center: LatLng, lat_span: f64, lng_span: f64) -> Self {
        let half_lat = lat_span.abs() / 2.0;
        let half_lng = lng_span.abs() / 2.0;
        if half_lng >= 180.0 {
            return GeoBounds::new(
                (center.lat - half_lat).max(-90.0),
                -180.0,
                (center.lat + half_lat).min(90.0),
                180.0,
            );
        }
        GeoBounds::new(
            (center.lat - half_lat).max(-90.0),
            wrap_lng(center.lng - half_lng),
            (center.lat + half_lat).min(90.0),
            wrap_lng(center.lng + half_lng),
        )
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, p: LatLng) -> bool {
        if p.lat < self.south || p.lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            p.lng >= self.west || p.lng <= self.east
        } else {
            p.lng >= self.west && p.lng <= self.east
        }
    }
}

fn wrap_lng(lng: f64) -> f64 {
    let mut l = lng;
    while l > 180.0 {
        l -= 360.0;
    }
    while l < -180.0 {
        l += 360.0;
    }
    l
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::coord::LatLng;

    #[test]
    fn contains_is_edge_inclusive() {
        let b = GeoBounds::new(40.0, -10.0, 50.0, 10.0);
        assert!(b.contains(LatLng::new(40.0, -10.0)));
        assert!(b.contains(LatLng::new(50.0, 10.0)));
        assert!(!b.contains(LatLng::new(50.1, 0.0)));
        assert!(!b.contains(LatLng::new(45.0, 10.1)));
    }

    #[test]
    fn antimeridian_box_wraps_longitude() {
        let b = GeoBounds::new(-50.0, 170.0, -30.0, -170.0);
        assert!(b.crosses_antimeridian());
        assert!(b.contains(LatLng::new(-40.0, 175.0)));
        assert!(b.contains(LatLng::new(-40.0, -175.0)));
        assert!(!b.contains(LatLng::new(-40.0, 0.0)));
    }

    #[test]
    fn from_center_span_wraps_edges() {
        let b = GeoBounds::from_center_span(LatLng::new(0.0, 175.0), 20.0, 20.0);
        assert_eq!(b.west, 165.0);
        assert_eq!(b.east, -175.0);
        assert!(b.contains(LatLng::new(5.0, -178.0)));

        let world = GeoBounds::from_center_span(LatLng::new(0.0, 0.0), 400.0, 400.0);
        assert_eq!((world.south, world.north), (-90.0, 90.0));
        assert!(world.contains(LatLng::new(89.0, 179.0)));
    }
}
