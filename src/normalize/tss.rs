//! Total Sum Scaling (TSS) normalization for compositional data.
//!
//! TSS converts abundances to relative abundances by dividing each value by
//! the total of its sample.

use super::clr::TransformedMatrix;
use crate::data::AbundanceMatrix;
use crate::error::{MicrobiomeError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Convert every sample to proportions summing to one.
///
/// A sample with zero total abundance cannot be scaled and is an error
/// naming the sample.
pub fn norm_tss(matrix: &AbundanceMatrix) -> Result<TransformedMatrix> {
    let n_features = matrix.n_features();
    let n_samples = matrix.n_samples();

    if n_features == 0 || n_samples == 0 {
        return Err(MicrobiomeError::InsufficientData(
            "Cannot apply TSS to an empty matrix".to_string(),
        ));
    }

    let library_sizes = matrix.col_sums();
    if let Some(j) = library_sizes.iter().position(|&s| s <= 0.0) {
        return Err(MicrobiomeError::InsufficientData(format!(
            "Sample '{}' has zero total abundance and cannot be scaled to proportions",
            matrix.sample_ids()[j]
        )));
    }

    let normalized_cols: Vec<Vec<f64>> = (0..n_samples)
        .into_par_iter()
        .map(|j| {
            let lib_size = library_sizes[j];
            (0..n_features).map(|i| matrix.get(i, j) / lib_size).collect()
        })
        .collect();

    let mut data = DMatrix::zeros(n_features, n_samples);
    for (j, col) in normalized_cols.iter().enumerate() {
        for (i, &val) in col.iter().enumerate() {
            data[(i, j)] = val;
        }
    }

    Ok(TransformedMatrix {
        data,
        feature_ids: matrix.feature_ids().to_vec(),
        sample_ids: matrix.sample_ids().to_vec(),
        transformation: "TSS".to_string(),
        geometric_means: vec![],
    })
}
