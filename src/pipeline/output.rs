use std::collections::BTreeMap;

use geo::Point;

use crate::{
    common::{RegionName, Theme, UnitId},
    geom::{Border, Boundaries, Coverage},
    theme::{ColorMap, Rgb},
};

/// A point marker for a unit that carries coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub unit: UnitId,
    /// (lon, lat)
    pub location: Point<f64>,
    pub code: Option<String>,
}

/// Everything one pipeline run computes. Geometry is in lon/lat.
/// Read-only: filtering borrows from it and never mutates it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub(crate) regions: Boundaries,
    pub(crate) owners: BTreeMap<RegionName, Option<UnitId>>,
    pub(crate) region_themes: BTreeMap<RegionName, Theme>,
    pub(crate) unit_themes: BTreeMap<UnitId, Theme>,
    pub(crate) coverage: BTreeMap<UnitId, Coverage>,
    pub(crate) borders: BTreeMap<UnitId, Border>,
    pub(crate) themes: Vec<Theme>,
    pub(crate) theme_colors: ColorMap<Theme>,
    pub(crate) unit_colors: ColorMap<UnitId>,
    pub(crate) markers: Vec<Marker>,
    pub(crate) neutral: Rgb,
    pub(crate) digest: Option<String>,
}

impl PipelineOutput {
    /// Region shapes as loaded.
    #[inline] pub fn regions(&self) -> &Boundaries { &self.regions }

    /// Owning unit of every known region (`None` for unowned regions).
    #[inline] pub fn owners(&self) -> &BTreeMap<RegionName, Option<UnitId>> { &self.owners }

    /// Owning unit of `region`.
    #[inline]
    pub fn owner(&self, region: &str) -> Option<&UnitId> {
        self.owners.get(region).and_then(Option::as_ref)
    }

    /// Region → predominant theme, for regions that have one.
    #[inline] pub fn region_themes(&self) -> &BTreeMap<RegionName, Theme> { &self.region_themes }

    #[inline]
    pub fn region_theme(&self, region: &str) -> Option<&Theme> { self.region_themes.get(region) }

    /// Unit → predominant theme, for units with at least one theme.
    #[inline] pub fn unit_themes(&self) -> &BTreeMap<UnitId, Theme> { &self.unit_themes }

    #[inline] pub fn coverage(&self) -> &BTreeMap<UnitId, Coverage> { &self.coverage }

    /// Empty when borders were not requested.
    #[inline] pub fn borders(&self) -> &BTreeMap<UnitId, Border> { &self.borders }

    /// All distinct themes, sorted.
    #[inline] pub fn themes(&self) -> &[Theme] { &self.themes }

    #[inline] pub fn theme_colors(&self) -> &ColorMap<Theme> { &self.theme_colors }

    #[inline] pub fn unit_colors(&self) -> &ColorMap<UnitId> { &self.unit_colors }

    /// Empty when markers were not requested.
    #[inline] pub fn markers(&self) -> &[Marker] { &self.markers }

    /// Fill used for regions without a theme.
    #[inline] pub fn neutral(&self) -> Rgb { self.neutral }

    /// SHA-256 of the raw inputs, if they were loaded from bytes.
    #[inline] pub fn digest(&self) -> Option<&str> { self.digest.as_deref() }
}
