use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{common::{RegionRecord, UnitRecord}, error::{Error, Result}, geom::{Boundaries, SourceCrs}};

use super::{read_boundaries_geojson, read_regions_csv, read_units_csv, TableColumns};

/// The three inputs of one pipeline run, read-only after load.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub units: Vec<UnitRecord>,
    pub regions: Vec<RegionRecord>,
    pub boundaries: Boundaries,
    digest: Option<String>,
}

impl SourceTables {
    /// Wrap tables that were built in memory; they carry no content digest.
    pub fn new(units: Vec<UnitRecord>, regions: Vec<RegionRecord>, boundaries: Boundaries) -> Self {
        Self { units, regions, boundaries, digest: None }
    }

    /// Parse the raw CSV and GeoJSON documents.
    pub fn from_bytes(units_csv: &[u8], regions_csv: &[u8], boundaries_geojson: &[u8], columns: &TableColumns, crs: SourceCrs) -> Result<Self> {
        Ok(Self {
            units: read_units_csv(units_csv, columns)?,
            regions: read_regions_csv(regions_csv, columns)?,
            boundaries: read_boundaries_geojson(boundaries_geojson, columns, crs)?,
            digest: Some(content_digest(&[units_csv, regions_csv, boundaries_geojson])),
        })
    }

    /// Read and parse the three input files.
    pub fn from_paths(units: &Path, regions: &Path, boundaries: &Path, columns: &TableColumns, crs: SourceCrs) -> Result<Self> {
        let read = |path: &Path| std::fs::read(path).map_err(|e| Error::malformed(format!("cannot read {}: {e}", path.display())));
        Self::from_bytes(&read(units)?, &read(regions)?, &read(boundaries)?, columns, crs)
    }

    /// SHA-256 of the raw inputs, when loaded from bytes or files.
    #[inline] pub fn digest(&self) -> Option<&str> { self.digest.as_deref() }
}

/// Hex SHA-256 over length-prefixed parts, so moving bytes between parts
/// changes the digest.
pub(crate) fn content_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}
