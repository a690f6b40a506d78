//! Pipeline composition and execution for matrix transforms.

mod runner;

pub use runner::{Pipeline, PipelineConfig, PipelineStep};
