//! Centered Log-Ratio (CLR) transformation for compositional data.

use crate::error::{MicrobiomeError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A transformed matrix with metadata about the transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedMatrix {
    /// The transformed data (features × samples).
    #[serde(skip, default = "empty_matrix")]
    pub data: DMatrix<f64>,
    /// Feature identifiers.
    pub feature_ids: Vec<String>,
    /// Sample identifiers.
    pub sample_ids: Vec<String>,
    /// Name of the transformation applied.
    pub transformation: String,
    /// Geometric means per sample (CLR only, empty otherwise).
    pub geometric_means: Vec<f64>,
}

fn empty_matrix() -> DMatrix<f64> {
    DMatrix::zeros(0, 0)
}

impl TransformedMatrix {
    /// Get the transformed value for a feature and sample.
    pub fn get(&self, feature: usize, sample: usize) -> f64 {
        self.data[(feature, sample)]
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Get a row (feature) as a vector.
    pub fn row(&self, feature: usize) -> Vec<f64> {
        self.data.row(feature).iter().cloned().collect()
    }

    /// Get a column (sample) as a vector.
    pub fn col(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().cloned().collect()
    }
}

/// Apply Centered Log-Ratio (CLR) transformation.
///
/// For sample j: CLR(x_ij) = ln(x_ij) - mean_i(ln(x_ij)).
///
/// Input must be strictly positive; add a pseudocount first.
pub fn norm_clr(
    data: &DMatrix<f64>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
) -> Result<TransformedMatrix> {
    let (n_features, n_samples) = data.shape();

    if n_features == 0 || n_samples == 0 {
        return Err(MicrobiomeError::InsufficientData(
            "Cannot apply CLR to an empty matrix".to_string(),
        ));
    }

    for j in 0..n_samples {
        for i in 0..n_features {
            let val = data[(i, j)];
            if !(val > 0.0) {
                return Err(MicrobiomeError::InvalidParameter(format!(
                    "CLR requires positive values; found {} for taxon '{}' in sample '{}'",
                    val,
                    feature_ids.get(i).map(String::as_str).unwrap_or("?"),
                    sample_ids.get(j).map(String::as_str).unwrap_or("?"),
                )));
            }
        }
    }

    let log_data: DMatrix<f64> = data.map(|x| x.ln());

    let mean_logs: Vec<f64> = (0..n_samples)
        .into_par_iter()
        .map(|j| log_data.column(j).sum() / n_features as f64)
        .collect();

    let mut clr_data = log_data;
    for (j, &mean_log) in mean_logs.iter().enumerate() {
        for i in 0..n_features {
            clr_data[(i, j)] -= mean_log;
        }
    }

    Ok(TransformedMatrix {
        data: clr_data,
        feature_ids,
        sample_ids,
        transformation: "CLR".to_string(),
        geometric_means: mean_logs.iter().map(|m| m.exp()).collect(),
    })
}

/// Apply CLR directly to an abundance matrix after adding a pseudocount.
pub fn norm_clr_with_pseudocount(
    matrix: &crate::data::AbundanceMatrix,
    pseudocount: f64,
) -> Result<TransformedMatrix> {
    let data = crate::zero::pseudocount::add_pseudocount(matrix, pseudocount)?;
    norm_clr(&data, matrix.feature_ids().to_vec(), matrix.sample_ids().to_vec())
}
