use std::fmt;
use std::str::FromStr;

use foundation::LatLng;
use serde::{Deserialize, Serialize};

/// Coarse geographic bucket assigned by [`classify`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Oceania,
    Antarctica,
}

impl Region {
    /// Display order used by filters and the URL `regions` parameter.
    pub const ALL: [Region; 7] = [
        Region::NorthAmerica,
        Region::SouthAmerica,
        Region::Europe,
        Region::Africa,
        Region::Asia,
        Region::Oceania,
        Region::Antarctica,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::Europe => "Europe",
            Region::Africa => "Africa",
            Region::Asia => "Asia",
            Region::Oceania => "Oceania",
            Region::Antarctica => "Antarctica",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRegion(pub String);

impl fmt::Display for UnknownRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown region: {:?}", self.0)
    }
}

impl std::error::Error for UnknownRegion {}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// Assigns a region from fixed bounding-box rules.
///
/// Rules are evaluated in order and the first match wins; Asia is the
/// catch-all. This is a heuristic, so coordinates near the edges can land in
/// a neighbouring region. Thresholds must stay exactly as written.
pub fn classify(lat: f64, lng: f64) -> Region {
    if lat <= -60.0 {
        return Region::Antarctica;
    }
    if lat >= 7.0 && lng < -25.0 {
        return Region::NorthAmerica;
    }
    if lat < 12.0 && (-92.0..=-34.0).contains(&lng) {
        return Region::SouthAmerica;
    }
    if lat > 35.0 && (-25.0..=45.0).contains(&lng) {
        return Region::Europe;
    }
    if lat < 38.0 && lat > -35.0 && (-20.0..=52.0).contains(&lng) {
        return Region::Africa;
    }
    if (lat <= 0.0 && (110.0..=180.0).contains(&lng))
        || (lat < -25.0 && (145.0..=180.0).contains(&lng))
    {
        return Region::Oceania;
    }
    Region::Asia
}

pub fn classify_point(p: LatLng) -> Region {
    classify(p.lat, p.lng)
}

#[cfg(test)]
mod tests {
    use super::{Region, classify};

    #[test]
    fn reference_places() {
        // Reykjavik fails rule 2 (lng -21.9 is not < -25) and lands in Europe.
        assert_eq!(classify(64.1, -21.9), Region::Europe);
        assert_eq!(classify(-54.8, -68.3), Region::SouthAmerica);
        assert_eq!(classify(-77.8, 166.7), Region::Antarctica);
    }

    #[test]
    fn rule_order_is_significant() {
        // Satisfies both the North America and South America boxes; rule 2 wins.
        assert_eq!(classify(10.0, -80.0), Region::NorthAmerica);
        // Satisfies both Europe and Africa; rule 4 wins.
        assert_eq!(classify(36.5, 10.0), Region::Europe);
        // Below -60 beats everything.
        assert_eq!(classify(-60.0, -60.0), Region::Antarctica);
    }

    #[test]
    fn boundary_values() {
        assert_eq!(classify(7.0, -25.1), Region::NorthAmerica);
        assert_eq!(classify(6.99, -60.0), Region::SouthAmerica);
        assert_eq!(classify(35.0, 10.0), Region::Africa);
        assert_eq!(classify(0.0, 110.0), Region::Oceania);
        assert_eq!(classify(-30.0, 145.0), Region::Oceania);
        assert_eq!(classify(-59.9, 100.0), Region::Asia);
    }

    #[test]
    fn catch_all_is_asia() {
        assert_eq!(classify(27.98, 86.92), Region::Asia);
        assert_eq!(classify(-40.0, 100.0), Region::Asia);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for r in Region::ALL {
            assert_eq!(r.name().parse::<Region>(), Ok(r));
        }
        assert_eq!(" north america ".parse::<Region>(), Ok(Region::NorthAmerica));
        assert!("Atlantis".parse::<Region>().is_err());
    }
}
