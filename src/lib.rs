#![doc = "Covermap public API"]
//! Aggregates region boundaries into per-unit coverage areas, resolves each
//! region's predominant theme, and projects the result down to a unit/theme
//! selection for rendering.
mod common;
mod config;
mod error;
mod pipeline;

pub mod filter;
pub mod geom;
pub mod io;
pub mod theme;

#[doc(inline)]
pub use common::{RegionName, RegionRecord, Theme, UnitId, UnitRecord};

#[doc(inline)]
pub use config::PipelineConfig;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use filter::{Projection, Selection, UnitFilter};

#[doc(inline)]
pub use io::{SourceTables, TableColumns};

#[doc(inline)]
pub use pipeline::{Marker, Pipeline, PipelineOutput};
