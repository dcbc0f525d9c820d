//! CSV table reading.

use std::{io::Cursor, path::Path};

use geo::Point;
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, StringChunked}};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{common::{RegionRecord, UnitId, UnitRecord}, error::{Error, Result}};

/// Column headers (and the boundary name property) the loaders read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableColumns {
    pub unit: String,
    pub themes: String,
    pub latitude: String,
    pub longitude: String,
    pub code: String,
    pub region: String,
    pub owner: String,
    /// GeoJSON feature property holding the region name.
    pub region_property: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            unit: "unit".into(),
            themes: "themes".into(),
            latitude: "latitude".into(),
            longitude: "longitude".into(),
            code: "code".into(),
            region: "region".into(),
            owner: "owner".into(),
            region_property: "name".into(),
        }
    }
}

impl TableColumns {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }
}

/// Reads CSV bytes into a DataFrame with every column kept as a string.
fn read_frame(bytes: &[u8], table: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| Error::malformed(format!("{table} table is not valid CSV: {e}")))
}

fn required<'a>(df: &'a DataFrame, name: &str, table: &str) -> Result<&'a StringChunked> {
    let column = df.column(name).map_err(|_| {
        let available = df.get_column_names().iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
        Error::malformed(format!("{table} table has no column {name:?} (found: {available})"))
    })?;
    Ok(column.str()?)
}

fn optional<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    df.column(name).ok()?.str().ok()
}

/// Non-blank trimmed cell text.
fn cell<'a>(column: &'a StringChunked, row: usize) -> Option<&'a str> {
    column.get(row).map(str::trim).filter(|text| !text.is_empty())
}

/// Parse a coordinate, accepting a decimal comma.
fn coordinate(column: Option<&StringChunked>, row: usize) -> Option<f64> {
    let text = cell(column?, row)?;
    text.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read the units × themes table.
pub fn read_units_csv(bytes: &[u8], columns: &TableColumns) -> Result<Vec<UnitRecord>> {
    let df = read_frame(bytes, "units")?;
    let ids = required(&df, &columns.unit, "units")?;
    let themes = required(&df, &columns.themes, "units")?;
    let lat = optional(&df, &columns.latitude);
    let lon = optional(&df, &columns.longitude);
    let code = optional(&df, &columns.code);

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let Some(id) = cell(ids, row) else {
            warn!(row, "units row without an identifier skipped");
            continue
        };

        let location = match (coordinate(lon, row), coordinate(lat, row)) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };

        records.push(UnitRecord {
            id: UnitId::new(id),
            themes: themes.get(row).unwrap_or_default().to_string(),
            location,
            code: code.and_then(|c| cell(c, row)).map(str::to_string),
        });
    }
    Ok(records)
}

/// Read the region → owning unit table. Blank owners mean "no owner".
pub fn read_regions_csv(bytes: &[u8], columns: &TableColumns) -> Result<Vec<RegionRecord>> {
    let df = read_frame(bytes, "regions")?;
    let regions = required(&df, &columns.region, "regions")?;
    let owners = required(&df, &columns.owner, "regions")?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let Some(region) = cell(regions, row) else {
            warn!(row, "regions row without a name skipped");
            continue
        };
        records.push(RegionRecord::new(region, cell(owners, row)));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = "\
unit,themes,latitude,longitude,code
PIN,\"Educação, Artes, Educação\",-23.55,-46.63,P1
PIR,\"Saúde,Tecnologia\",,,
,Moda,-22.0,-47.0,X
";

    #[test]
    fn reads_units() {
        let units = read_units_csv(UNITS.as_bytes(), &TableColumns::default()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].id.as_str(), "PIN");
        assert_eq!(units[0].themes, "Educação, Artes, Educação");
        assert_eq!(units[0].location, Some(Point::new(-46.63, -23.55)));
        assert_eq!(units[0].code.as_deref(), Some("P1"));
        assert_eq!(units[1].location, None);
        assert_eq!(units[1].code, None);
    }

    #[test]
    fn decimal_comma_coordinates() {
        let csv = "unit,themes,latitude,longitude\nPIN,Artes,\"-23,5\",\"-46,25\"\n";
        let units = read_units_csv(csv.as_bytes(), &TableColumns::default()).unwrap();
        assert_eq!(units[0].location, Some(Point::new(-46.25, -23.5)));
    }

    #[test]
    fn missing_theme_column_is_malformed() {
        let csv = "unit,latitude\nPIN,-23.5\n";
        let err = read_units_csv(csv.as_bytes(), &TableColumns::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }), "{err}");
        assert!(err.to_string().contains("themes"));
    }

    #[test]
    fn custom_headers() {
        let columns = TableColumns { unit: "unidade".into(), themes: "eixos".into(), ..Default::default() };
        let csv = "unidade,eixos\nPIN,Saúde\n";
        let units = read_units_csv(csv.as_bytes(), &columns).unwrap();
        assert_eq!(units[0].themes, "Saúde");
    }

    #[test]
    fn reads_regions_with_blank_owners() {
        let csv = "region,owner\nCampinas,PIN\nSantos,\nSorocaba,  PIR \n";
        let regions = read_regions_csv(csv.as_bytes(), &TableColumns::default()).unwrap();
        assert_eq!(regions, [
            RegionRecord::new("Campinas", Some("PIN")),
            RegionRecord::new("Santos", None),
            RegionRecord::new("Sorocaba", Some("PIR")),
        ]);
    }

    #[test]
    fn missing_owner_column_is_malformed() {
        let err = read_regions_csv(b"region\nCampinas\n", &TableColumns::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }
}
