use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use geo::MultiPolygon;
use tracing::{debug, info, warn};

use crate::{
    common::{RegionName, RegionRecord, UnitId},
    config::PipelineConfig,
    error::Result,
    geom::{Boundaries, BorderExtractor, CoverageEngine, Deadline, Projector},
    io::SourceTables,
    theme::{resolve_regions, resolve_units, ColorMap, ThemeIndex},
};

use super::{Marker, PipelineOutput};

/// Member shapes per unit, in UTM metres.
type Members = BTreeMap<UnitId, Vec<(RegionName, MultiPolygon<f64>)>>;

/// The single geometry/theme pipeline. Optional stages are switched on and
/// off by the configuration rather than by separate code paths.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, rejecting an invalid configuration up front.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Run every stage on `sources`. Only malformed input, an exhausted union
    /// budget or a projection failure abort the run; per-region and per-unit
    /// problems degrade that entry and are logged.
    pub fn run(&self, sources: &SourceTables) -> Result<PipelineOutput> {
        let config = &self.config;

        let index = ThemeIndex::build(&sources.units);
        info!(units = index.num_units(), themes = index.themes().len(), "theme index built");

        if sources.boundaries.is_empty() {
            warn!("no boundary features; every unit's coverage will be empty");
        }
        let owners = ownership(&sources.regions, &sources.boundaries);
        let unmatched = unmatched_regions(&owners, &sources.boundaries);
        if !unmatched.is_empty() {
            info!(count = unmatched.len(), first = %unmatched[0], "regions in the table without a boundary feature");
        }
        let region_themes = resolve_regions(&owners, &index);
        let unit_themes = resolve_units(&index);
        info!(regions = owners.len(), themed = region_themes.len(), "predominant themes resolved");

        let projector = Projector::for_extent(sources.boundaries.crs(), sources.boundaries.bounds())?;
        let (zone, north) = projector.zone();
        debug!(zone, north, "working projection is UTM");

        let members = members(&owners, &sources.boundaries, &projector);
        let engine = CoverageEngine::new(Deadline::new(config.union_budget()));
        let metric_coverage = engine.build(&members)?;
        info!(units = metric_coverage.len(), "coverage built");

        let metric_borders = if config.include_borders {
            BorderExtractor::new(config.buffer_distance)?.extract_all(&metric_coverage)
        } else {
            BTreeMap::new()
        };

        let mut coverage = BTreeMap::new();
        for (unit, mut entry) in metric_coverage {
            entry.geometry = projector.to_geographic(&entry.geometry)?;
            coverage.insert(unit, entry);
        }

        let mut borders = BTreeMap::new();
        for (unit, mut border) in metric_borders {
            border.geometry = projector.to_geographic(&border.geometry)?;
            borders.insert(unit, border);
        }

        let theme_colors = ColorMap::assign(index.themes().iter().cloned(), config.palette);
        let unit_colors = ColorMap::assign(
            index.units().chain(coverage.keys()).cloned().collect::<BTreeSet<_>>(),
            config.palette,
        );

        let markers = if config.include_markers { markers(sources) } else { Vec::new() };

        Ok(PipelineOutput {
            regions: sources.boundaries.clone(),
            owners,
            region_themes,
            unit_themes,
            coverage,
            borders,
            themes: index.themes().to_vec(),
            theme_colors,
            unit_colors,
            markers,
            neutral: config.neutral_rgb()?,
            digest: sources.digest().map(str::to_string),
        })
    }
}

/// Region → owner for every region in the table or the boundary data.
/// Boundary features missing from the table are unowned; a region listed
/// twice keeps its first owner.
fn ownership(records: &[RegionRecord], boundaries: &Boundaries) -> BTreeMap<RegionName, Option<UnitId>> {
    let mut owners = BTreeMap::new();
    for record in records {
        match owners.entry(record.region.clone()) {
            Entry::Vacant(slot) => { slot.insert(record.owner.clone()); }
            Entry::Occupied(slot) => {
                if slot.get() != &record.owner {
                    warn!(region = %record.region, "region listed twice with different owners; keeping the first");
                }
            }
        }
    }

    for (name, _) in boundaries.iter() {
        owners.entry(name.clone()).or_insert(None);
    }
    owners
}

/// Regions known to the table but missing from the boundary data, in name order.
fn unmatched_regions<'a>(owners: &'a BTreeMap<RegionName, Option<UnitId>>, boundaries: &Boundaries) -> Vec<&'a RegionName> {
    owners.keys().filter(|region| !boundaries.contains(region.as_str())).collect()
}

/// Owned regions grouped by unit and projected to metres. Regions without a
/// boundary feature, or whose projection fails, are left out.
fn members(owners: &BTreeMap<RegionName, Option<UnitId>>, boundaries: &Boundaries, projector: &Projector) -> Members {
    let mut members = Members::new();
    for (region, owner) in owners {
        let Some(unit) = owner else { continue };

        let Some(shape) = boundaries.get(region.as_str()) else {
            warn!(%region, %unit, "owned region has no boundary feature");
            continue
        };

        match projector.to_metric(shape) {
            Ok(metric) => members.entry(unit.clone()).or_default().push((region.clone(), metric)),
            Err(error) => warn!(%region, %unit, %error, "region excluded from coverage"),
        }
    }
    members
}

/// One marker per unit: the first row of that unit that has coordinates.
fn markers(sources: &SourceTables) -> Vec<Marker> {
    let mut seen = BTreeSet::new();
    sources.units.iter()
        .filter_map(|record| {
            let location = record.location?;
            seen.insert(record.id.clone()).then(|| Marker {
                unit: record.id.clone(),
                location,
                code: record.code.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::{common::UnitRecord, geom::SourceCrs};

    fn cell(lon: f64, lat: f64) -> MultiPolygon<f64> {
        let d = 0.05;
        MultiPolygon::new(vec![polygon![
            (x: lon, y: lat), (x: lon + d, y: lat), (x: lon + d, y: lat + d), (x: lon, y: lat + d),
        ]])
    }

    #[test]
    fn ownership_covers_table_and_boundaries() {
        let boundaries = Boundaries::new([
            (RegionName::new("A"), cell(-47.0, -23.0)),
            (RegionName::new("Z"), cell(-46.0, -23.0)),
        ], SourceCrs::Wgs84);
        let owners = ownership(&[
            RegionRecord::new("A", Some("PIN")),
            RegionRecord::new("A", Some("PIR")),
            RegionRecord::new("B", Some("PIN")),
        ], &boundaries);

        assert_eq!(owners.get("A"), Some(&Some(UnitId::new("PIN"))));
        assert_eq!(owners.get("B"), Some(&Some(UnitId::new("PIN"))));
        assert_eq!(owners.get("Z"), Some(&None));
    }

    #[test]
    fn members_skip_regions_without_shapes() {
        let boundaries = Boundaries::new([(RegionName::new("A"), cell(-47.0, -23.0))], SourceCrs::Wgs84);
        let owners = ownership(&[
            RegionRecord::new("A", Some("PIN")),
            RegionRecord::new("B", Some("PIN")),
        ], &boundaries);
        let projector = Projector::for_extent(SourceCrs::Wgs84, boundaries.bounds()).unwrap();

        let members = members(&owners, &boundaries, &projector);
        let pin = &members[&UnitId::new("PIN")];
        assert_eq!(pin.len(), 1);
        assert_eq!(pin[0].0.as_str(), "A");
        assert_eq!(unmatched_regions(&owners, &boundaries), [&RegionName::new("B")]);
    }

    #[test]
    fn run_without_boundaries_is_empty_not_an_error() {
        let sources = SourceTables::new(
            vec![UnitRecord::new("PIN", "Artes")],
            vec![RegionRecord::new("A", Some("PIN"))],
            Boundaries::new([], SourceCrs::Wgs84),
        );
        let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&sources).unwrap();
        assert!(output.regions().is_empty());
        assert!(output.coverage().is_empty());
        assert_eq!(output.region_theme("A").map(|theme| theme.as_str()), Some("Artes"));
    }

    #[test]
    fn first_located_row_makes_the_marker() {
        let mut first = UnitRecord::new("PIN", "Artes");
        let mut second = UnitRecord::new("PIN", "Saúde");
        first.location = None;
        second.location = Some(geo::Point::new(-46.6, -23.5));
        second.code = Some("P1".into());
        let mut third = UnitRecord::new("PIN", "Moda");
        third.location = Some(geo::Point::new(0.0, 0.0));

        let boundaries = Boundaries::new([], SourceCrs::Wgs84);
        let sources = SourceTables::new(vec![first, second, third], vec![], boundaries);
        let markers = markers(&sources);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code.as_deref(), Some("P1"));
    }
}
