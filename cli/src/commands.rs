pub mod render;
pub mod themes;

use std::path::Path;

use anyhow::{Context, Result};
use covermap::{PipelineConfig, TableColumns};

/// The config file at `path`, or the defaults.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// The column mapping at `path`, or the default headers.
fn load_columns(path: Option<&Path>) -> Result<TableColumns> {
    match path {
        Some(path) => TableColumns::from_json_file(path)
            .with_context(|| format!("cannot load column mapping {}", path.display())),
        None => Ok(TableColumns::default()),
    }
}
