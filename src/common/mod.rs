mod id;
mod record;

pub use id::{RegionName, Theme, UnitId};
pub use record::{RegionRecord, UnitRecord};
