use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the coverage pipeline.
///
/// Only `MalformedInput`, `GeometryTimeout`, `Config`, `Projection` and the
/// wrapped I/O errors abort a run. `GeometryRepair` is produced per region
/// and absorbed by the union engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A required column/property is missing or a table could not be parsed.
    #[error("malformed input: {what}")]
    MalformedInput { what: String },

    /// A region's geometry could not be made valid.
    #[error("geometry of region {region:?} cannot be repaired: {reason}")]
    GeometryRepair { region: String, reason: String },

    /// The union wall-clock budget ran out.
    #[error("coverage union timed out at unit {unit:?} after {elapsed:?} (budget {budget:?})")]
    GeometryTimeout { unit: String, elapsed: Duration, budget: Duration },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("projection failed: {reason}")]
    Projection { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl Error {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::MalformedInput { what: what.into() }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
