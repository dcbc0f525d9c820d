use geo::Point;

use super::{RegionName, UnitId};

/// One row of the units × themes table.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub id: UnitId,
    /// Raw comma-delimited theme text, e.g. `"Educação, Saúde"`.
    pub themes: String,
    /// Marker position (lon, lat), when the row carries coordinates.
    pub location: Option<Point<f64>>,
    /// Optional short code shown on the marker.
    pub code: Option<String>,
}

impl UnitRecord {
    pub fn new(id: impl Into<UnitId>, themes: impl Into<String>) -> Self {
        Self { id: id.into(), themes: themes.into(), location: None, code: None }
    }
}

/// One row of the region → owning unit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRecord {
    pub region: RegionName,
    pub owner: Option<UnitId>,
}

impl RegionRecord {
    pub fn new(region: impl Into<RegionName>, owner: Option<&str>) -> Self {
        Self { region: region.into(), owner: owner.map(UnitId::from) }
    }
}
