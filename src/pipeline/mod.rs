//! Analysis configuration and the end-to-end runner.

mod config;
mod runner;

pub use config::{AnalysisConfig, OutputConfig, EXAMPLE_CONFIG};
pub use runner::{AnalysisReport, Pipeline, Stage};
