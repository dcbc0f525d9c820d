//! GeoJSON boundary reading and map export.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::{
    common::RegionName,
    error::{Error, Result},
    filter::{Projection, RegionView, UnitView},
    geom::{Boundaries, SourceCrs},
    theme::StyleRecord,
};

use super::TableColumns;

/// Read a FeatureCollection of named Polygon/MultiPolygon features.
/// Features without a name or with unusable geometry are skipped.
pub fn read_boundaries_geojson(bytes: &[u8], columns: &TableColumns, crs: SourceCrs) -> Result<Boundaries> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::malformed(format!("boundaries are not valid JSON: {e}")))?;

    if value["type"].as_str() != Some("FeatureCollection") {
        return Err(Error::malformed("boundaries must be a GeoJSON FeatureCollection"))
    }
    let features = value["features"].as_array()
        .ok_or_else(|| Error::malformed("boundaries FeatureCollection has no features array"))?;

    let mut named = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let name = match &feature["properties"][&columns.region_property] {
            Value::String(name) if !name.trim().is_empty() => name.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                warn!(index, property = %columns.region_property, "boundary feature without a name skipped");
                continue
            }
        };

        match parse_geometry(&feature["geometry"]) {
            Ok(shape) => named.push((RegionName::new(name), shape)),
            Err(reason) => warn!(index, region = %name, %reason, "boundary feature skipped"),
        }
    }
    Ok(Boundaries::new(named, crs))
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, String> {
    let coords = geometry["coordinates"].as_array().ok_or("geometry has no coordinates")?;
    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon::new(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => {
            let polygons = coords.iter()
                .map(|polygon| parse_polygon(polygon.as_array().ok_or("polygon is not an array")?))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        Some(other) => Err(format!("unsupported geometry type {other}")),
        None => Err("geometry has no type".into()),
    }
}

/// `[exterior, hole, hole, ...]`
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| parse_ring(ring.as_array().ok_or("ring is not an array")?));
    let exterior = rings.next().ok_or("polygon has no exterior ring")??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// `[[x, y], [x, y], ...]`, closed if it is not already.
fn parse_ring(coords: &[Value]) -> Result<LineString<f64>, String> {
    let mut points = coords.iter()
        .map(|pair| -> Result<Coord<f64>, String> {
            let x = pair[0].as_f64().ok_or("x must be a number")?;
            let y = pair[1].as_f64().ok_or("y must be a number")?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }
    Ok(LineString(points))
}

/// GeoJSON geometry object for a MultiPolygon.
pub fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = mp.0.iter()
        .map(|polygon| {
            let rings: Vec<Vec<[f64; 2]>> = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
                .collect();
            json!(rings)
        })
        .collect();
    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

fn style_properties(properties: &mut Map<String, Value>, style: &StyleRecord) {
    properties.insert("fill".into(), json!(style.fill.to_string()));
    properties.insert("fill_opacity".into(), json!(style.fill_opacity));
    properties.insert("stroke".into(), json!(style.stroke.to_string()));
    properties.insert("weight".into(), json!(style.weight));
}

fn region_feature(view: &RegionView<'_>, selected: bool) -> Value {
    let mut properties = Map::new();
    properties.insert("layer".into(), json!("region"));
    properties.insert("name".into(), json!(view.name.as_str()));
    properties.insert("unit".into(), json!(view.owner.map(|unit| unit.as_str())));
    properties.insert("theme".into(), json!(view.theme.map(|theme| theme.as_str())));
    properties.insert("selected".into(), json!(selected));
    style_properties(&mut properties, &view.style);

    json!({
        "type": "Feature",
        "id": view.name.as_str(),
        "geometry": multipolygon_to_geojson(view.shape),
        "properties": properties,
    })
}

/// Coverage feature of one unit, then its border when it has one.
fn unit_features(view: &UnitView<'_>, selected: bool, features: &mut Vec<Value>) {
    let color = view.style.fill.to_string();
    let mut properties = Map::new();
    properties.insert("layer".into(), json!("coverage"));
    properties.insert("unit".into(), json!(view.unit.as_str()));
    properties.insert("theme".into(), json!(view.theme.map(|theme| theme.as_str())));
    properties.insert("selected".into(), json!(selected));
    properties.insert("color".into(), json!(color));
    properties.insert("fallback".into(), json!(view.coverage.fallback.to_string()));
    properties.insert("members".into(), json!(view.coverage.members.iter().map(RegionName::as_str).collect::<Vec<_>>()));
    properties.insert("excluded".into(), json!(view.coverage.excluded.iter().map(RegionName::as_str).collect::<Vec<_>>()));
    style_properties(&mut properties, &view.style);
    features.push(json!({
        "type": "Feature",
        "geometry": multipolygon_to_geojson(&view.coverage.geometry),
        "properties": properties,
    }));

    if let Some(border) = view.border {
        features.push(json!({
            "type": "Feature",
            "geometry": multipolygon_to_geojson(&border.geometry),
            "properties": {
                "layer": "border",
                "unit": view.unit.as_str(),
                "selected": selected,
                "color": color,
                "fallback": border.fallback.to_string(),
            },
        }));
    }
}

impl Projection<'_> {
    /// Export as one FeatureCollection: background and selected regions,
    /// then coverage and borders (theme-less units first, unselected),
    /// then markers, each tagged with a `layer`.
    pub fn to_geojson(&self) -> Value {
        let units = self.background_units.len() + self.units.len();
        let mut features = Vec::with_capacity(
            self.background.len() + self.regions.len() + 2 * units + self.markers.len()
        );

        features.extend(self.background.iter().map(|view| region_feature(view, false)));
        features.extend(self.regions.iter().map(|view| region_feature(view, true)));

        for view in &self.background_units {
            unit_features(view, false, &mut features);
        }
        for view in &self.units {
            unit_features(view, true, &mut features);
        }

        for marker in &self.markers {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [marker.location.x(), marker.location.y()],
                },
                "properties": {
                    "layer": "marker",
                    "unit": marker.unit.as_str(),
                    "code": marker.code,
                },
            }));
        }

        let legend: Map<String, Value> = self.legend.iter()
            .map(|(theme, color)| (theme.to_string(), json!(color.to_string())))
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
            "legend": legend,
            "neutral": self.neutral.to_string(),
            "source_sha256": self.digest,
        })
    }
}
