mod color;
mod index;
mod predominance;
mod style;

pub use color::{ColorMap, Palette, Rgb};
pub use index::{split_themes, ThemeIndex};
pub use predominance::{predominant, resolve_regions, resolve_units};
pub use style::{neutral_unit_style, style_for, unit_style, RegionProperties, StyleRecord};
