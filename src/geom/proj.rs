use geo::{Coord, MapCoords, MultiPolygon, Rect};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{Error, Result};

/// Geographic CRS the boundary data may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCrs {
    /// EPSG:4326
    Wgs84,
    /// EPSG:4269
    Nad83,
    /// EPSG:4674
    Sirgas2000,
}

impl SourceCrs {
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        match epsg {
            4326 => Ok(Self::Wgs84),
            4269 => Ok(Self::Nad83),
            4674 => Ok(Self::Sirgas2000),
            other => Err(Error::config(format!(
                "unsupported source CRS EPSG:{other} (expected 4326, 4269 or 4674)"
            ))),
        }
    }

    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Nad83 => 4269,
            Self::Sirgas2000 => 4674,
        }
    }

    /// PROJ.4 datum clause shared by the geographic and UTM definitions.
    fn datum(self) -> &'static str {
        match self {
            Self::Wgs84 => "+datum=WGS84",
            Self::Nad83 => "+datum=NAD83",
            Self::Sirgas2000 => "+ellps=GRS80 +towgs84=0,0,0,0,0,0,0",
        }
    }

    /// Build PROJ.4 string for the source geographic CRS (degrees → radians handled in code).
    fn geographic_proj4(self) -> String {
        format!("+proj=longlat {} +no_defs +type=crs", self.datum())
    }
}

/// UTM zone (1..=60) and hemisphere for a lon/lat centre.
pub(crate) fn utm_zone(center: Coord<f64>) -> (u32, bool) {
    let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
    (zone, center.y >= 0.0)
}

/// Forward and inverse transforms between the source geographic CRS and the
/// UTM zone covering the data, so buffer distances are in metres.
pub struct Projector {
    geographic: Proj4,
    metric: Proj4,
    zone: u32,
    north: bool,
}

impl Projector {
    /// Build a projector whose UTM zone is chosen from the centre of `extent`.
    pub fn for_extent(crs: SourceCrs, extent: Option<Rect<f64>>) -> Result<Self> {
        // São Paulo state centre, used only when there is no data at all.
        let center = extent.map(|rect| rect.center())
            .unwrap_or(Coord { x: -48.5, y: -22.0 });
        let (zone, north) = utm_zone(center);

        // NAD83 UTM only standard in north; fall back to WGS84 in south.
        let datum = match crs {
            SourceCrs::Nad83 if !north => SourceCrs::Wgs84.datum(),
            _ => crs.datum(),
        };
        let south = if north { "" } else { " +south" };
        let metric_def = format!("+proj=utm +zone={zone}{south} {datum} +units=m +no_defs +type=crs");

        let geographic_def = crs.geographic_proj4();
        let geographic = Proj4::from_proj_string(&geographic_def)
            .map_err(|e| Error::Projection { reason: format!("failed to build source PROJ.4 {geographic_def}: {e:?}") })?;
        let metric = Proj4::from_proj_string(&metric_def)
            .map_err(|e| Error::Projection { reason: format!("failed to build target PROJ.4 {metric_def}: {e:?}") })?;

        Ok(Self { geographic, metric, zone, north })
    }

    /// UTM zone number and hemisphere in use.
    #[inline] pub fn zone(&self) -> (u32, bool) { (self.zone, self.north) }

    /// Reproject a shape from lon/lat degrees to UTM metres.
    pub fn to_metric(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        shape.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
            transform(&self.geographic, &self.metric, &mut point)
                .map_err(|e| Error::Projection { reason: format!("({}, {}) to UTM: {e:?}", coord.x, coord.y) })?;
            Ok(Coord { x: point.0, y: point.1 })
        })
    }

    /// Reproject a shape from UTM metres back to lon/lat degrees.
    pub fn to_geographic(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        shape.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x, coord.y, 0.0);
            transform(&self.metric, &self.geographic, &mut point)
                .map_err(|e| Error::Projection { reason: format!("({}, {}) from UTM: {e:?}", coord.x, coord.y) })?;
            Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
        })
    }
}
