//! Multiple testing correction.

pub mod bh;
pub mod fwer;

pub use bh::adjust_bh;
pub use fwer::{adjust_bonferroni, adjust_holm};

use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};

/// Correction method applied across all defined p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Correction {
    /// False discovery rate control.
    BenjaminiHochberg,
    /// Family-wise error rate, single step.
    Bonferroni,
    /// Family-wise error rate, step-down.
    Holm,
    /// Report raw p-values as adjusted.
    None,
}

impl Correction {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BenjaminiHochberg => "benjamini-hochberg",
            Self::Bonferroni => "bonferroni",
            Self::Holm => "holm",
            Self::None => "none",
        }
    }

    /// Adjust `p_values`, returning values in input order.
    ///
    /// Every adjusted value is at least its raw value.
    pub fn adjust(&self, p_values: &[f64]) -> Result<Vec<f64>> {
        if let Some((i, p)) = p_values
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "p-value at index {} is out of range [0, 1]: {}",
                i, p
            )));
        }
        let adjusted = match self {
            Self::BenjaminiHochberg => adjust_bh(p_values),
            Self::Bonferroni => adjust_bonferroni(p_values),
            Self::Holm => adjust_holm(p_values),
            Self::None => p_values.to_vec(),
        };
        // Guard against rounding below the raw value.
        Ok(adjusted
            .into_iter()
            .zip(p_values)
            .map(|(q, &p)| q.max(p))
            .collect())
    }
}
