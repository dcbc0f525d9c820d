use geo::{BooleanOps, Coord, LineString, MultiPolygon, Orient, Polygon, Validation};
use geo::orient::Direction;

use crate::{common::RegionName, error::{Error, Result}};

use super::{guarded, is_degenerate};

/// Close the ring, drop consecutive duplicates, and reject rings that cannot
/// enclose any area or carry non-finite coordinates.
fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) { return None }

    let mut coords: Vec<Coord<f64>> = ring.coords().copied().collect();
    coords.dedup();
    if coords.len() > 1 && coords.first() == coords.last() { coords.pop(); }
    if coords.len() < 3 { return None }

    if !spans_area(&coords) { return None }

    coords.push(coords[0]);
    Some(LineString::new(coords))
}

/// True unless every vertex lies on one line. Signed area is no use here: a
/// self-intersecting bowtie has zero signed area but still encloses two lobes.
fn spans_area(coords: &[Coord<f64>]) -> bool {
    let origin = coords[0];
    let Some(axis) = coords.iter().find(|c| **c != origin).map(|c| *c - origin) else { return false };
    coords.iter().any(|c| {
        let v = *c - origin;
        axis.x * v.y - axis.y * v.x != 0.0
    })
}

/// Rebuild a polygon from cleaned rings. Holes that cannot be cleaned are
/// dropped; an exterior that cannot be cleaned drops the whole polygon.
fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Make a region's geometry valid before it takes part in a union.
///
/// Ring problems (unclosed rings, repeated vertices, collapsed rings) are
/// fixed in place, orientation is normalized to CCW exteriors with CW holes,
/// and self-intersections are resolved by overlaying the shape with nothing.
/// Rings with non-finite coordinates are dropped. Fails when nothing with
/// positive area survives.
pub fn repair(region: &RegionName, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    let failure = |reason: &str| Error::GeometryRepair { region: region.to_string(), reason: reason.into() };

    let cleaned = MultiPolygon::new(shape.0.iter().filter_map(clean_polygon).collect())
        .orient(Direction::Default);
    if cleaned.0.is_empty() { return Err(failure("no ring encloses a positive area")) }
    if cleaned.is_valid() { return Ok(cleaned) }

    let resolved = guarded(|| cleaned.union(&MultiPolygon::new(vec![])))
        .map_err(|panic| failure(&format!("self-intersection overlay failed: {panic}")))?
        .orient(Direction::Default);

    if is_degenerate(&resolved) { return Err(failure("empty after resolving self-intersections")) }
    if !resolved.is_valid() { return Err(failure("still invalid after resolving self-intersections")) }
    Ok(resolved)
}
