//! Read-only projection of a pipeline run down to a unit/theme selection.

use std::collections::{BTreeMap, BTreeSet};

use geo::{BoundingRect, Intersects, MultiPolygon, Rect};

use crate::{
    common::{RegionName, Theme, UnitId},
    geom::{Border, Coverage},
    pipeline::{Marker, PipelineOutput},
    theme::{neutral_unit_style, style_for, unit_style, RegionProperties, Rgb, StyleRecord},
};

/// Which units pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnitFilter {
    #[default]
    All,
    One(UnitId),
}

impl UnitFilter {
    #[inline]
    pub fn accepts(&self, unit: &UnitId) -> bool {
        match self {
            Self::All => true,
            Self::One(selected) => selected == unit,
        }
    }
}

/// The active selection. An empty theme set is valid and selects nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub unit: UnitFilter,
    pub themes: BTreeSet<Theme>,
    /// Optional lon/lat viewport.
    pub bounds: Option<Rect<f64>>,
}

impl Selection {
    pub fn new(unit: UnitFilter, themes: impl IntoIterator<Item = Theme>) -> Self {
        Self { unit, themes: themes.into_iter().collect(), bounds: None }
    }

    /// Every unit and every theme of `output`.
    pub fn everything(output: &PipelineOutput) -> Self {
        Self::new(UnitFilter::All, output.themes().iter().cloned())
    }

    pub fn with_bounds(mut self, bounds: Rect<f64>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    fn in_view(&self, shape: &MultiPolygon<f64>) -> bool {
        match (self.bounds, shape.bounding_rect()) {
            (None, _) => true,
            (Some(view), Some(rect)) => view.intersects(&rect),
            (Some(_), None) => false,
        }
    }

    /// A unit passes when the unit filter accepts it and its own predominant
    /// theme is selected.
    fn unit_passes(&self, unit: &UnitId, theme: Option<&Theme>) -> bool {
        self.unit.accepts(unit) && theme.is_some_and(|theme| self.themes.contains(theme))
    }
}

/// One region as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionView<'a> {
    pub name: &'a RegionName,
    pub owner: Option<&'a UnitId>,
    pub theme: Option<&'a Theme>,
    pub shape: &'a MultiPolygon<f64>,
    pub style: StyleRecord,
}

/// One unit's coverage and border as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitView<'a> {
    pub unit: &'a UnitId,
    pub theme: Option<&'a Theme>,
    pub coverage: &'a Coverage,
    pub border: Option<&'a Border>,
    pub style: StyleRecord,
}

/// What passes a [`Selection`], borrowed from the [`PipelineOutput`].
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    /// Regions whose owner passes the unit filter and whose theme is selected.
    pub regions: Vec<RegionView<'a>>,
    /// Every other region in view, painted neutral.
    pub background: Vec<RegionView<'a>>,
    /// Units that pass the unit filter and whose theme is selected.
    pub units: Vec<UnitView<'a>>,
    /// Units in view that pass the unit filter but have no predominant theme
    /// (blank themes or missing from the units table), painted neutral.
    pub background_units: Vec<UnitView<'a>>,
    pub markers: Vec<&'a Marker>,
    /// Selected themes that occur in the data, with their colours.
    pub legend: BTreeMap<&'a Theme, Rgb>,
    pub neutral: Rgb,
    pub digest: Option<&'a str>,
}

impl<'a> Projection<'a> {
    #[inline]
    pub fn region_names(&self) -> impl Iterator<Item = &'a RegionName> + '_ {
        self.regions.iter().map(|view| view.name)
    }

    #[inline]
    pub fn unit_ids(&self) -> impl Iterator<Item = &'a UnitId> + '_ {
        self.units.iter().map(|view| view.unit)
    }
}

impl PipelineOutput {
    /// Project this run down to `selection`. Nothing in `self` changes, so
    /// the same output can be projected any number of times.
    pub fn project(&self, selection: &Selection) -> Projection<'_> {
        let colors = self.theme_colors();
        let neutral = self.neutral();

        let names: Vec<&RegionName> = match &selection.bounds {
            Some(view) => {
                let hits: BTreeSet<&RegionName> = self.regions().query(view).collect();
                self.regions().iter().map(|(name, _)| name).filter(|name| hits.contains(name)).collect()
            }
            None => self.regions().iter().map(|(name, _)| name).collect(),
        };

        let mut regions = Vec::new();
        let mut background = Vec::new();
        for name in names {
            let Some(shape) = self.regions().get(name.as_str()) else { continue };
            let owner = self.owner(name.as_str());
            let theme = self.region_theme(name.as_str());
            let selected = owner.is_some_and(|unit| selection.unit.accepts(unit))
                && theme.is_some_and(|theme| selection.themes.contains(theme));

            if selected {
                let style = style_for(&RegionProperties { name, owner, theme }, colors, neutral);
                regions.push(RegionView { name, owner, theme, shape, style });
            } else {
                let style = style_for(&RegionProperties { name, owner, theme: None }, colors, neutral);
                background.push(RegionView { name, owner, theme, shape, style });
            }
        }

        let mut units = Vec::new();
        let mut background_units = Vec::new();
        for (unit, coverage) in self.coverage() {
            if !selection.unit.accepts(unit) || !selection.in_view(&coverage.geometry) { continue }
            let theme = self.unit_themes().get(unit);
            let border = self.borders().get(unit);
            match theme {
                Some(theme) if selection.themes.contains(theme) => units.push(UnitView {
                    unit,
                    theme: Some(theme),
                    coverage,
                    border,
                    style: unit_style(unit, self.unit_colors(), neutral),
                }),
                Some(_) => {}
                None => background_units.push(UnitView {
                    unit,
                    theme: None,
                    coverage,
                    border,
                    style: neutral_unit_style(neutral),
                }),
            }
        }

        let markers = self.markers().iter()
            .filter(|marker| selection.unit_passes(&marker.unit, self.unit_themes().get(&marker.unit)))
            .filter(|marker| selection.bounds.is_none_or(|view| view.intersects(&marker.location.0)))
            .collect();

        let legend = self.theme_colors().iter()
            .filter(|(theme, _)| selection.themes.contains(*theme))
            .collect();

        Projection { regions, background, units, background_units, markers, legend, neutral, digest: self.digest() }
    }
}
