//! Loading the source tables and exporting projections.
//!
//! - `table` - units and regions CSV tables (polars)
//! - `geojson` - region boundaries in, map FeatureCollection out
//! - `source` - the three inputs of a run and their content digest

mod geojson;
mod source;
mod table;

pub use geojson::{multipolygon_to_geojson, read_boundaries_geojson};
pub use source::SourceTables;
pub use table::{read_regions_csv, read_units_csv, TableColumns};
