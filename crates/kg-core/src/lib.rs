//! Pipelines behind the `kg-embed` binary.

pub mod config;
pub mod pipeline;
pub mod results;
