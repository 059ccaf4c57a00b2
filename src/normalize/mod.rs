//! Abundance transformations applied before differential testing.
//!
//! - **TSS**: Total sum scaling / relative abundance
//! - **CLR**: Centered log-ratio after an explicit pseudocount

pub mod clr;
pub mod tss;

pub use clr::{norm_clr, norm_clr_with_pseudocount, TransformedMatrix};
pub use tss::norm_tss;

use crate::data::AbundanceMatrix;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Transformation applied to abundances before testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Transform {
    /// Raw abundances.
    None,
    /// Relative abundance (TSS).
    Relative,
    /// CLR after adding `pseudocount` to every entry.
    Clr { pseudocount: f64 },
}

impl Transform {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Relative => "relative",
            Self::Clr { .. } => "clr",
        }
    }

    /// Apply the transformation to a matrix.
    pub fn apply(&self, matrix: &AbundanceMatrix) -> Result<TransformedMatrix> {
        match *self {
            Self::None => Ok(TransformedMatrix {
                data: matrix.to_dense(),
                feature_ids: matrix.feature_ids().to_vec(),
                sample_ids: matrix.sample_ids().to_vec(),
                transformation: "none".to_string(),
                geometric_means: vec![],
            }),
            Self::Relative => norm_tss(matrix),
            Self::Clr { pseudocount } => norm_clr_with_pseudocount(matrix, pseudocount),
        }
    }
}
