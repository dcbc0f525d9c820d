mod output;
mod pipeline;

pub use output::{Marker, PipelineOutput};
pub use pipeline::Pipeline;
