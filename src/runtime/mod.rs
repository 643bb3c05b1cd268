//! Runtime module: ties the search, formatting and network stages into one
//! run and persists its report.

pub mod pipeline;

pub use pipeline::{NetworkReport, OrthoPipeline, PipelineReport, StageTimings};
