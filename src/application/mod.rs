pub mod pipeline;

pub use pipeline::{PipelineError, PipelineInputs, PipelineReport, PipelineStatus, SignalPipeline};
