use serde::Serialize;

/// Choropleth fill class for a per-country place count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FillBucket {
    /// No places: the country is drawn without fill.
    Empty,
    One,
    Few,
    Several,
    Many,
}

impl FillBucket {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => FillBucket::Empty,
            1 => FillBucket::One,
            2..=3 => FillBucket::Few,
            4..=6 => FillBucket::Several,
            _ => FillBucket::Many,
        }
    }

    /// Five-step blue ramp, light to dark.
    pub fn style(self) -> FillStyle {
        match self {
            FillBucket::Empty => FillStyle::new("#ffffff", 0.0),
            FillBucket::One => FillStyle::new("#deebf7", 0.6),
            FillBucket::Few => FillStyle::new("#9ecae1", 0.6),
            FillBucket::Several => FillStyle::new("#4292c6", 0.65),
            FillBucket::Many => FillStyle::new("#08519c", 0.7),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FillStyle {
    pub color: &'static str,
    pub opacity: f32,
}

impl FillStyle {
    pub const fn new(color: &'static str, opacity: f32) -> Self {
        Self { color, opacity }
    }
}

#[cfg(test)]
mod tests {
    use super::FillBucket;

    #[test]
    fn bucket_edges() {
        assert_eq!(FillBucket::for_count(0), FillBucket::Empty);
        assert_eq!(FillBucket::for_count(1), FillBucket::One);
        assert_eq!(FillBucket::for_count(3), FillBucket::Few);
        assert_eq!(FillBucket::for_count(4), FillBucket::Several);
        assert_eq!(FillBucket::for_count(7), FillBucket::Many);
        assert_eq!(FillBucket::Empty.style().opacity, 0.0);
    }
}
