use anyhow::{Context, Result};
use covermap::{io::read_units_csv, theme::{ColorMap, ThemeIndex}};

use super::{load_columns, load_config};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ThemesArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let columns = load_columns(args.columns.as_deref())?;

    let bytes = std::fs::read(&args.units)
        .with_context(|| format!("[themes] cannot read {}", args.units.display()))?;
    let units = read_units_csv(&bytes, &columns)?;
    let index = ThemeIndex::build(&units);
    let colors = ColorMap::assign(index.themes().iter().cloned(), config.palette);

    for (theme, color) in colors.iter() {
        println!("{color}\t{theme}");
    }
    Ok(())
}
