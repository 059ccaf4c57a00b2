//! Filtering primitives for abundance matrices.

pub mod prevalence;

pub use prevalence::{feature_prevalence, filter_prevalence_overall, FilterResult, PrevalenceFilter};
