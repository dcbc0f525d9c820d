use std::{collections::BTreeMap, fmt};

use geo::{BooleanOps, BoundingRect, Buffer, Coord, MultiPolygon, Rect};
use tracing::warn;

use crate::{common::UnitId, error::{Error, Result}};

use super::{guarded, is_degenerate, Coverage};

/// Which shape a unit's border ended up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BorderFallback {
    /// `buffer(coverage, d) − coverage`: the outward band only.
    Ring,
    /// The subtraction came out empty, so the whole buffered shape is used.
    /// A known approximation: the band then also covers the unit itself.
    Buffer,
    /// Buffering failed; the coverage bounding box grown by `d` is used.
    Envelope,
}

impl fmt::Display for BorderFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ring => "ring",
            Self::Buffer => "buffer",
            Self::Envelope => "envelope",
        })
    }
}

/// Border band around one unit's coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub geometry: MultiPolygon<f64>,
    pub fallback: BorderFallback,
}

/// Derives ring-shaped borders at a fixed offset distance.
#[derive(Debug, Clone, Copy)]
pub struct BorderExtractor {
    distance: f64,
}

impl BorderExtractor {
    /// `distance` is in the linear unit of the coverage CRS and must be positive.
    pub fn new(distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(Error::config(format!("border distance must be positive, got {distance}")))
        }
        Ok(Self { distance })
    }

    #[inline] pub fn distance(&self) -> f64 { self.distance }

    /// Borders for every unit with non-empty coverage. A failure in one unit
    /// only affects that unit's fallback level.
    pub fn extract_all(&self, coverage: &BTreeMap<UnitId, Coverage>) -> BTreeMap<UnitId, Border> {
        coverage.iter()
            .filter_map(|(unit, coverage)| self.extract(unit, &coverage.geometry).map(|border| (unit.clone(), border)))
            .collect()
    }

    /// Border of one coverage geometry, or `None` when the coverage is empty.
    pub fn extract(&self, unit: &UnitId, coverage: &MultiPolygon<f64>) -> Option<Border> {
        let d = self.distance;
        self.extract_with(unit, coverage, |coverage| coverage.buffer(d))
    }

    /// The ladder with `buffer` producing the buffered coverage.
    fn extract_with<F>(&self, unit: &UnitId, coverage: &MultiPolygon<f64>, buffer: F) -> Option<Border>
    where
        F: FnOnce(&MultiPolygon<f64>) -> MultiPolygon<f64>,
    {
        if coverage.0.is_empty() { return None }
        let d = self.distance;

        match guarded(|| {
            let buffered = buffer(coverage);
            let ring = buffered.difference(coverage);
            (buffered, ring)
        }) {
            Ok((_, ring)) if !is_degenerate(&ring) => {
                return Some(Border { geometry: ring, fallback: BorderFallback::Ring })
            }
            Ok((buffered, _)) if !is_degenerate(&buffered) => {
                warn!(%unit, fallback = %BorderFallback::Buffer, "border ring is empty; using the full buffer");
                return Some(Border { geometry: buffered, fallback: BorderFallback::Buffer })
            }
            Ok(_) => warn!(%unit, fallback = %BorderFallback::Envelope, "buffer is empty; using the grown envelope"),
            Err(panic) => warn!(%unit, fallback = %BorderFallback::Envelope, error = %panic, "buffer failed; using the grown envelope"),
        }

        let rect = coverage.bounding_rect()?;
        let grown = MultiPolygon::new(vec![Rect::new(
            Coord { x: rect.min().x - d, y: rect.min().y - d },
            Coord { x: rect.max().x + d, y: rect.max().y + d },
        ).to_polygon()]);

        let geometry = match guarded(|| grown.difference(coverage)) {
            Ok(ring) if !is_degenerate(&ring) => ring,
            _ => grown,
        };
        Some(Border { geometry, fallback: BorderFallback::Envelope })
    }
}
