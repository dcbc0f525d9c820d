use std::path::PathBuf;

use anyhow::{Context, Result};
use covermap::{Pipeline, PipelineConfig, Selection, SourceTables, TableColumns, Theme, UnitFilter, UnitId};
use tracing::{info, warn};

use super::{load_columns, load_config};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RenderArgs) -> Result<()> {
    let out_path: PathBuf = args.output.clone().unwrap_or("./covermap.geojson".into());

    let mut config: PipelineConfig = load_config(args.config.as_deref())?;
    if args.no_borders { config.include_borders = false }
    if args.no_markers { config.include_markers = false }
    if let Some(distance) = args.buffer_distance { config.buffer_distance = distance }

    let columns: TableColumns = load_columns(args.columns.as_deref())?;
    let sources = SourceTables::from_paths(&args.units, &args.regions, &args.boundaries, &columns, config.source_crs()?)
        .context("[render] failed to load source tables")?;
    info!(units = sources.units.len(), regions = sources.regions.len(), boundaries = sources.boundaries.len(), "[render] sources loaded");

    let output = Pipeline::new(config)?.run(&sources).context("[render] pipeline failed")?;

    let unit = match &args.unit {
        Some(id) => {
            if !output.unit_themes().contains_key(id.as_str()) && !output.coverage().contains_key(id.as_str()) {
                warn!(unit = %id, "[render] selected unit is not in the data");
            }
            UnitFilter::One(UnitId::new(id.as_str()))
        }
        None => UnitFilter::All,
    };

    let selection = if args.themes.is_empty() {
        Selection { unit, ..Selection::everything(&output) }
    } else {
        for theme in &args.themes {
            if !output.themes().iter().any(|known| known.as_str() == theme) {
                warn!(%theme, "[render] selected theme is not in the data");
            }
        }
        Selection::new(unit, args.themes.iter().map(|theme| Theme::new(theme.as_str())))
    };

    let projection = output.project(&selection);
    info!(regions = projection.regions.len(), units = projection.units.len(), background_units = projection.background_units.len(), "[render] selection projected");

    let bytes = serde_json::to_vec(&projection.to_geojson())?;
    std::fs::write(&out_path, bytes)
        .with_context(|| format!("[render] cannot write {}", out_path.display()))?;
    info!(path = %out_path.display(), "[render] map written");

    Ok(())
}
