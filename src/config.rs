use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::{Error, Result}, geom::SourceCrs, theme::{Palette, Rgb}};

/// Selects which optional pipeline stages run and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Compute a border ring around each unit's coverage.
    pub include_borders: bool,
    /// Emit a point marker per unit that carries coordinates.
    pub include_markers: bool,
    /// Border offset, in metres of the working UTM projection.
    pub buffer_distance: f64,
    /// EPSG code of the boundary data's geographic CRS.
    pub source_epsg: u32,
    /// Wall-clock budget for the coverage union stage, in milliseconds.
    pub union_budget_ms: Option<u64>,
    pub palette: Palette,
    /// Fill for regions without a predominant theme, as `#rrggbb`.
    pub neutral_color: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_borders: true,
            include_markers: true,
            buffer_distance: 1000.0,
            source_epsg: 4326,
            union_budget_ms: None,
            palette: Palette::default(),
            neutral_color: "#cccccc".into(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !self.buffer_distance.is_finite() || self.buffer_distance <= 0.0 {
            return Err(Error::config(format!(
                "buffer_distance must be a positive number of metres, got {}",
                self.buffer_distance
            )))
        }
        self.source_crs()?;
        self.neutral_rgb()?;
        Ok(())
    }

    /// The boundary data's CRS.
    pub fn source_crs(&self) -> Result<SourceCrs> {
        SourceCrs::from_epsg(self.source_epsg)
    }

    #[inline]
    pub(crate) fn union_budget(&self) -> Option<Duration> {
        self.union_budget_ms.map(Duration::from_millis)
    }

    pub(crate) fn neutral_rgb(&self) -> Result<Rgb> {
        Rgb::from_hex(&self.neutral_color)
            .ok_or_else(|| Error::config(format!("neutral_color {:?} is not #rrggbb", self.neutral_color)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_distance, 1000.0);
        assert!(config.include_borders && config.include_markers);
    }

    #[test]
    fn rejects_non_positive_distance() {
        for d in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig { buffer_distance: d, ..Default::default() };
            assert!(matches!(config.validate(), Err(Error::Config { .. })), "accepted {d}");
        }
    }

    #[test]
    fn rejects_unsupported_crs_and_bad_colour() {
        let config = PipelineConfig { source_epsg: 3857, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = PipelineConfig { neutral_color: "grey".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn partial_json_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "include_markers": false, "palette": "golden_angle" }}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert!(!config.include_markers);
        assert!(config.include_borders);
        assert_eq!(config.palette, Palette::GoldenAngle);
        assert_eq!(config.buffer_distance, 1000.0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<PipelineConfig>(r#"{ "bufferDistance": 10 }"#);
        assert!(err.is_err());
    }
}
