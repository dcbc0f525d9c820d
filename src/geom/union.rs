use std::{collections::BTreeMap, fmt, time::{Duration, Instant}};

use geo::{BooleanOps, BoundingRect, ConvexHull, Coord, MultiPolygon, Rect};
use tracing::{debug, warn};

use crate::{common::{RegionName, UnitId}, error::{Error, Result}};

use super::{bbox::merge_rects, guarded, is_degenerate, repair};

/// How far down the fallback ladder a unit's coverage had to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnionFallback {
    /// True union of the repaired member geometries.
    Union,
    /// Cumulative union of the members' convex hulls.
    HullUnion,
    /// Bounding box of all members' combined extent.
    Envelope,
}

impl fmt::Display for UnionFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Union => "union",
            Self::HullUnion => "hull_union",
            Self::Envelope => "envelope",
        })
    }
}

/// Merged geometry of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub geometry: MultiPolygon<f64>,
    pub fallback: UnionFallback,
    /// Member regions, sorted by name.
    pub members: Vec<RegionName>,
    /// Members whose geometry could not be repaired and were left out of the union.
    pub excluded: Vec<RegionName>,
}

/// Wall-clock budget shared by every union in one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn new(budget: Option<Duration>) -> Self {
        Self { start: Instant::now(), budget }
    }

    #[inline] pub fn unlimited() -> Self { Self::new(None) }

    /// Fail with `GeometryTimeout` once the budget is spent.
    pub fn check(&self, unit: &UnitId) -> Result<()> {
        let Some(budget) = self.budget else { return Ok(()) };
        let elapsed = self.start.elapsed();
        if elapsed >= budget {
            return Err(Error::GeometryTimeout { unit: unit.to_string(), elapsed, budget })
        }
        Ok(())
    }
}

/// Unions member region geometries into one coverage geometry per unit,
/// degrading through hull union and envelope when the true union fails.
#[derive(Debug, Clone, Copy)]
pub struct CoverageEngine {
    deadline: Deadline,
}

impl CoverageEngine {
    pub fn new(deadline: Deadline) -> Self { Self { deadline } }

    /// Build coverage for every unit. Units are processed in identifier order
    /// and each unit's members in name order.
    pub fn build(&self, members: &BTreeMap<UnitId, Vec<(RegionName, MultiPolygon<f64>)>>) -> Result<BTreeMap<UnitId, Coverage>> {
        members.iter()
            .filter(|(_, shapes)| !shapes.is_empty())
            .map(|(unit, shapes)| Ok((unit.clone(), self.cover(unit, shapes)?)))
            .collect()
    }

    /// Build coverage for one unit. Only a timeout is returned as an error;
    /// every other failure moves one rung down the ladder.
    pub fn cover(&self, unit: &UnitId, members: &[(RegionName, MultiPolygon<f64>)]) -> Result<Coverage> {
        self.cover_with(unit, members, |sorted| self.union_repaired(unit, sorted))
    }

    /// The ladder with `union` as its first rung. `union` returns the merged
    /// shape and the members it had to leave out.
    fn cover_with<F>(&self, unit: &UnitId, members: &[(RegionName, MultiPolygon<f64>)], union: F) -> Result<Coverage>
    where
        F: FnOnce(&[&(RegionName, MultiPolygon<f64>)]) -> Result<(MultiPolygon<f64>, Vec<RegionName>)>,
    {
        self.deadline.check(unit)?;

        let mut sorted = members.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let names = sorted.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();

        let attempt = guarded(|| union(&sorted[..]));
        let mut excluded = Vec::new();
        match attempt {
            Ok(result) => {
                let (union, dropped) = result?;
                excluded = dropped;
                if !is_degenerate(&union) {
                    debug!(%unit, members = names.len(), "coverage from true union");
                    return Ok(Coverage { geometry: union, fallback: UnionFallback::Union, members: names, excluded })
                }
                warn!(%unit, fallback = %UnionFallback::HullUnion, "union is empty; falling back to convex hulls");
            }
            Err(panic) => {
                warn!(%unit, fallback = %UnionFallback::HullUnion, error = %panic, "union failed; falling back to convex hulls");
            }
        }

        self.deadline.check(unit)?;
        match guarded(|| hull_union(&sorted)) {
            Ok(hulls) if !is_degenerate(&hulls) => {
                return Ok(Coverage { geometry: hulls, fallback: UnionFallback::HullUnion, members: names, excluded })
            }
            Ok(_) => warn!(%unit, fallback = %UnionFallback::Envelope, "hull union is empty; falling back to envelope"),
            Err(panic) => warn!(%unit, fallback = %UnionFallback::Envelope, error = %panic, "hull union failed; falling back to envelope"),
        }

        let geometry = envelope(&sorted)
            .map(|rect| MultiPolygon::new(vec![rect.to_polygon()]))
            .unwrap_or_else(|| {
                warn!(%unit, "no member has a finite extent; coverage is empty");
                MultiPolygon::new(vec![])
            });
        Ok(Coverage { geometry, fallback: UnionFallback::Envelope, members: names, excluded })
    }

    /// Repair each member, drop the ones that cannot be repaired, and fold the
    /// rest together with pairwise unions.
    fn union_repaired(&self, unit: &UnitId, members: &[&(RegionName, MultiPolygon<f64>)]) -> Result<(MultiPolygon<f64>, Vec<RegionName>)> {
        let mut excluded = Vec::new();
        let mut repaired = Vec::with_capacity(members.len());
        for (region, shape) in members {
            match repair(region, shape) {
                Ok(shape) => repaired.push(shape),
                Err(error) => {
                    warn!(%unit, %region, %error, "region excluded from coverage");
                    excluded.push(region.clone());
                }
            }
        }

        let mut union: Option<MultiPolygon<f64>> = None;
        for shape in repaired {
            self.deadline.check(unit)?;
            union = Some(match union {
                Some(acc) => acc.union(&shape),
                None => shape,
            });
        }

        Ok((union.unwrap_or_else(|| MultiPolygon::new(vec![])), excluded))
    }
}

/// Cumulative union of each member's convex hull, in list order.
fn hull_union(members: &[&(RegionName, MultiPolygon<f64>)]) -> MultiPolygon<f64> {
    members.iter()
        .map(|(_, shape)| MultiPolygon::new(vec![shape.convex_hull()]))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Combined extent of all members. A zero-width or zero-height extent is
/// padded by half a unit on each side so it still has area.
fn envelope(members: &[&(RegionName, MultiPolygon<f64>)]) -> Option<Rect<f64>> {
    let rect = members.iter()
        .filter_map(|(_, shape)| shape.bounding_rect())
        .filter(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y].iter().all(|v| v.is_finite()))
        .reduce(merge_rects)?;

    let pad_x = if rect.width() > 0.0 { 0.0 } else { 0.5 };
    let pad_y = if rect.height() > 0.0 { 0.0 } else { 0.5 };
    Some(Rect::new(
        Coord { x: rect.min().x - pad_x, y: rect.min().y - pad_y },
        Coord { x: rect.max().x + pad_x, y: rect.max().y + pad_y },
    ))
}
