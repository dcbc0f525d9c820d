use ahash::AHashMap;
use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTree, AABB};
use tracing::warn;

use crate::common::RegionName;

use super::{bbox::{merge_rects, BoundingBox}, SourceCrs};

/// Named region boundaries in a geographic CRS, with an R-tree over their
/// bounding boxes for viewport queries.
#[derive(Debug, Clone)]
pub struct Boundaries {
    names: Vec<RegionName>,
    shapes: Vec<MultiPolygon<f64>>,
    lookup: AHashMap<RegionName, usize>,
    rtree: RTree<BoundingBox>,
    crs: SourceCrs,
}

impl Boundaries {
    /// Construct from `(name, shape)` features. When a name repeats, the
    /// first feature wins.
    pub fn new(features: impl IntoIterator<Item = (RegionName, MultiPolygon<f64>)>, crs: SourceCrs) -> Self {
        let mut names = Vec::new();
        let mut shapes = Vec::new();
        let mut lookup = AHashMap::new();

        for (name, shape) in features {
            if lookup.contains_key(&name) {
                warn!(region = %name, "duplicate boundary feature ignored");
                continue
            }
            lookup.insert(name.clone(), names.len());
            names.push(name);
            shapes.push(shape);
        }

        // Shapes without coordinates have no envelope and are never returned by queries.
        let rtree = RTree::bulk_load(
            shapes.iter().enumerate()
                .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                .collect()
        );

        Self { names, shapes, lookup, rtree, crs }
    }

    /// Get the number of features.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no features.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn crs(&self) -> SourceCrs { self.crs }

    /// Shape of the region called `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&MultiPolygon<f64>> {
        self.lookup.get(name).map(|&i| &self.shapes[i])
    }

    #[inline] pub fn contains(&self, name: &str) -> bool { self.lookup.contains_key(name) }

    /// Iterate over `(name, shape)` in input order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&RegionName, &MultiPolygon<f64>)> + '_ {
        self.names.iter().zip(self.shapes.iter())
    }

    /// Compute the bounding rectangle of all features.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(merge_rects)
    }

    /// Names of the features whose bounding box intersects `rect`.
    pub fn query(&self, rect: &Rect<f64>) -> impl Iterator<Item = &RegionName> + '_ {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|bbox| &self.names[bbox.idx()])
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
        ]])
    }

    fn sample() -> Boundaries {
        Boundaries::new([
            (RegionName::new("A"), square(0.0, 0.0, 1.0)),
            (RegionName::new("B"), square(1.0, 0.0, 1.0)),
            (RegionName::new("C"), square(5.0, 5.0, 1.0)),
            (RegionName::new("A"), square(9.0, 9.0, 1.0)),
        ], SourceCrs::Wgs84)
    }

    #[test]
    fn first_duplicate_wins() {
        let boundaries = sample();
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries.get("A"), Some(&square(0.0, 0.0, 1.0)));
        assert!(boundaries.get("Z").is_none());
    }

    #[test]
    fn bounds_cover_everything() {
        let bounds = sample().bounds().unwrap();
        assert_eq!(bounds.min(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), coord! { x: 6.0, y: 6.0 });
    }

    #[test]
    fn query_by_envelope() {
        let boundaries = sample();
        let rect = Rect::new(coord! { x: 4.0, y: 4.0 }, coord! { x: 5.5, y: 5.5 });
        let found = boundaries.query(&rect).map(RegionName::as_str).collect::<Vec<_>>();
        assert_eq!(found, ["C"]);
    }
}
