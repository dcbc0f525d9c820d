use std::path::PathBuf;

/// Unit coverage map builder
#[derive(clap::Parser, Debug)]
#[command(name = "covermap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build coverage, borders and themes and write them as GeoJSON
    Render(RenderArgs),

    /// List the themes in a units table with their colours
    Themes(ThemesArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Units × themes CSV table
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub units: PathBuf,

    /// Region → owning unit CSV table
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Region boundaries (GeoJSON FeatureCollection)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Output GeoJSON file, defaults to "./covermap.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Pipeline configuration (JSON)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Column header mapping (JSON)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub columns: Option<PathBuf>,

    /// Show only this unit
    #[arg(long)]
    pub unit: Option<String>,

    /// Show only these themes (repeatable); all themes when omitted
    #[arg(long = "theme")]
    pub themes: Vec<String>,

    /// Skip the border rings
    #[arg(long)]
    pub no_borders: bool,

    /// Skip the unit markers
    #[arg(long)]
    pub no_markers: bool,

    /// Border distance in metres, overrides the config file
    #[arg(long)]
    pub buffer_distance: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ThemesArgs {
    /// Units × themes CSV table
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub units: PathBuf,

    /// Column header mapping (JSON)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub columns: Option<PathBuf>,

    /// Pipeline configuration (JSON), for the palette
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
