//! Sparsity profiling for abundance matrices.

use super::median;
use crate::data::AbundanceMatrix;
use serde::{Deserialize, Serialize};

/// Profile of sparsity characteristics in an abundance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparsityProfile {
    /// Total number of entries (taxa × samples).
    pub total_entries: usize,
    pub nonzero_entries: usize,
    pub zero_entries: usize,
    /// Overall sparsity (proportion of zeros).
    pub sparsity: f64,
    /// Sparsity per taxon (row).
    pub feature_sparsity: Vec<f64>,
    /// Sparsity per sample (column).
    pub sample_sparsity: Vec<f64>,
    pub mean_feature_sparsity: f64,
    pub mean_sample_sparsity: f64,
    pub median_feature_sparsity: f64,
    pub median_sample_sparsity: f64,
}

impl SparsityProfile {
    /// More than half of the entries are zero.
    pub fn is_highly_sparse(&self) -> bool {
        self.sparsity > 0.5
    }

    /// More than 90% of the entries are zero.
    pub fn is_ultra_sparse(&self) -> bool {
        self.sparsity > 0.9
    }
}

impl std::fmt::Display for SparsityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sparsity Profile")?;
        writeln!(f, "  Total entries:     {}", self.total_entries)?;
        writeln!(f, "  Non-zero entries:  {}", self.nonzero_entries)?;
        writeln!(f, "  Zero entries:      {}", self.zero_entries)?;
        writeln!(f, "  Overall sparsity:  {:.2}%", self.sparsity * 100.0)?;
        writeln!(f, "  Mean taxon sparsity:     {:.2}%", self.mean_feature_sparsity * 100.0)?;
        writeln!(f, "  Median taxon sparsity:   {:.2}%", self.median_feature_sparsity * 100.0)?;
        writeln!(f, "  Mean sample sparsity:    {:.2}%", self.mean_sample_sparsity * 100.0)?;
        writeln!(f, "  Median sample sparsity:  {:.2}%", self.median_sample_sparsity * 100.0)?;
        Ok(())
    }
}

/// Profile sparsity characteristics of an abundance matrix.
pub fn profile_sparsity(matrix: &AbundanceMatrix) -> SparsityProfile {
    let n_features = matrix.n_features();
    let n_samples = matrix.n_samples();
    let total_entries = n_features * n_samples;
    let nonzero_entries = matrix.nnz();
    let zero_entries = total_entries - nonzero_entries;
    let fraction = |zeros: usize, of: usize| if of == 0 { 0.0 } else { zeros as f64 / of as f64 };

    let feature_sparsity: Vec<f64> = matrix
        .row_nnz()
        .into_iter()
        .map(|nnz| fraction(n_samples - nnz, n_samples))
        .collect();

    let mut sample_nnz = vec![0usize; n_samples];
    for row_vec in matrix.data().outer_iterator() {
        for (col, _) in row_vec.iter() {
            sample_nnz[col] += 1;
        }
    }
    let sample_sparsity: Vec<f64> = sample_nnz
        .iter()
        .map(|&nnz| fraction(n_features - nnz, n_features))
        .collect();

    let mean = |v: &[f64]| if v.is_empty() { 0.0 } else { v.iter().sum::<f64>() / v.len() as f64 };

    SparsityProfile {
        total_entries,
        nonzero_entries,
        zero_entries,
        sparsity: fraction(zero_entries, total_entries),
        mean_feature_sparsity: mean(&feature_sparsity),
        mean_sample_sparsity: mean(&sample_sparsity),
        median_feature_sparsity: median(&feature_sparsity),
        median_sample_sparsity: median(&sample_sparsity),
        feature_sparsity,
        sample_sparsity,
    }
}
