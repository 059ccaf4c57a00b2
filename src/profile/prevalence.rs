//! Prevalence profiling for abundance matrices.

use super::median;
use crate::data::AbundanceMatrix;
use crate::filter::feature_prevalence;
use serde::{Deserialize, Serialize};

/// Profile of taxon prevalence across samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrevalenceProfile {
    pub n_features: usize,
    pub n_samples: usize,
    /// Proportion of non-zero samples per taxon.
    pub feature_prevalence: Vec<f64>,
    pub mean_prevalence: f64,
    pub median_prevalence: f64,
    pub min_prevalence: f64,
    pub max_prevalence: f64,
    /// Taxa present in every sample.
    pub n_ubiquitous: usize,
    /// Taxa present in exactly one sample.
    pub n_singletons: usize,
    /// Taxa below 10% prevalence.
    pub n_rare: usize,
    /// Taxa absent from every sample.
    pub n_absent: usize,
}

impl PrevalenceProfile {
    /// Indices of taxa at or above a prevalence threshold.
    pub fn features_above(&self, threshold: f64) -> Vec<usize> {
        (0..self.feature_prevalence.len())
            .filter(|&i| self.feature_prevalence[i] >= threshold)
            .collect()
    }
}

impl std::fmt::Display for PrevalenceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Prevalence Profile")?;
        writeln!(f, "  Taxa:          {}", self.n_features)?;
        writeln!(f, "  Samples:       {}", self.n_samples)?;
        writeln!(f, "  Mean prevalence:   {:.2}%", self.mean_prevalence * 100.0)?;
        writeln!(f, "  Median prevalence: {:.2}%", self.median_prevalence * 100.0)?;
        writeln!(f, "  Min prevalence:    {:.2}%", self.min_prevalence * 100.0)?;
        writeln!(f, "  Max prevalence:    {:.2}%", self.max_prevalence * 100.0)?;
        writeln!(f, "  Ubiquitous (100%): {}", self.n_ubiquitous)?;
        writeln!(f, "  Singletons (1 sample): {}", self.n_singletons)?;
        writeln!(f, "  Rare (<10%):  {}", self.n_rare)?;
        writeln!(f, "  Absent:       {}", self.n_absent)?;
        Ok(())
    }
}

/// Profile taxon prevalence of an abundance matrix.
pub fn profile_prevalence(matrix: &AbundanceMatrix) -> PrevalenceProfile {
    let n_features = matrix.n_features();
    let n_samples = matrix.n_samples();
    let feature_prevalence = feature_prevalence(matrix);
    let nnz = matrix.row_nnz();

    let mean_prevalence = if n_features > 0 {
        feature_prevalence.iter().sum::<f64>() / n_features as f64
    } else {
        0.0
    };
    let min_prevalence = feature_prevalence.iter().copied().fold(f64::INFINITY, f64::min);
    let max_prevalence = feature_prevalence.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    PrevalenceProfile {
        n_features,
        n_samples,
        mean_prevalence,
        median_prevalence: median(&feature_prevalence),
        min_prevalence: if min_prevalence.is_finite() { min_prevalence } else { 0.0 },
        max_prevalence: if max_prevalence.is_finite() { max_prevalence } else { 0.0 },
        n_ubiquitous: nnz.iter().filter(|&&c| n_samples > 0 && c == n_samples).count(),
        n_singletons: nnz.iter().filter(|&&c| c == 1).count(),
        n_rare: feature_prevalence.iter().filter(|&&p| p < 0.10).count(),
        n_absent: nnz.iter().filter(|&&c| c == 0).count(),
        feature_prevalence,
    }
}
