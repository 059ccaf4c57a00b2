//! Prevalence-based selection of taxa to test.

use crate::data::AbundanceMatrix;
use crate::error::{MicrobiomeError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fraction of samples in which each feature is non-zero.
pub fn feature_prevalence(matrix: &AbundanceMatrix) -> Vec<f64> {
    let n_samples = matrix.n_samples();
    if n_samples == 0 {
        return vec![0.0; matrix.n_features()];
    }
    matrix
        .row_nnz()
        .into_iter()
        .map(|nnz| nnz as f64 / n_samples as f64)
        .collect()
}

/// Tolerance when comparing a prevalence fraction with the threshold.
const PREVALENCE_TOLERANCE: f64 = 1e-12;

/// Select features present in at least `threshold` of the samples.
///
/// A feature passes when its prevalence (the value reported alongside the
/// selection) is at least `threshold`. Nothing passing is not an error: the
/// caller decides what an empty selection means.
pub fn filter_prevalence_overall(
    matrix: &AbundanceMatrix,
    threshold: f64,
) -> Result<PrevalenceFilter> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MicrobiomeError::InvalidParameter(format!(
            "Prevalence threshold must be between 0 and 1, got {}",
            threshold
        )));
    }

    let prevalence = feature_prevalence(matrix);
    let kept: Vec<usize> = (0..matrix.n_features())
        .into_par_iter()
        .filter(|&row| prevalence[row] >= threshold - PREVALENCE_TOLERANCE)
        .collect();

    let n_before = matrix.n_features();
    let n_after = kept.len();
    Ok(PrevalenceFilter {
        prevalence,
        kept,
        summary: FilterResult {
            threshold,
            n_before,
            n_after,
            n_removed: n_before - n_after,
            retention_rate: if n_before == 0 {
                0.0
            } else {
                n_after as f64 / n_before as f64
            },
        },
    })
}

/// Features selected by prevalence, with the prevalence of every feature.
#[derive(Debug, Clone)]
pub struct PrevalenceFilter {
    /// Indices of kept features, ascending.
    pub kept: Vec<usize>,
    /// Prevalence of every feature (kept or not).
    pub prevalence: Vec<f64>,
    pub summary: FilterResult,
}

/// Result of prevalence filtering with statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Minimum prevalence applied.
    pub threshold: f64,
    /// Number of features before filtering.
    pub n_before: usize,
    /// Number of features after filtering.
    pub n_after: usize,
    /// Number of features removed.
    pub n_removed: usize,
    /// Proportion of features retained.
    pub retention_rate: f64,
}

impl std::fmt::Display for FilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Prevalence filter (>= {:.1}%)", self.threshold * 100.0)?;
        writeln!(f, "  Before:    {} taxa", self.n_before)?;
        writeln!(f, "  After:     {} taxa", self.n_after)?;
        writeln!(f, "  Removed:   {} taxa", self.n_removed)?;
        writeln!(f, "  Retained:  {:.1}%", self.retention_rate * 100.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_matrix() -> AbundanceMatrix {
        // 4 features × 5 samples
        AbundanceMatrix::from_rows(
            &[
                vec![10.0, 20.0, 30.0, 40.0, 50.0],
                vec![10.0, 0.0, 30.0, 0.0, 0.0],
                vec![10.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0, 0.0],
            ],
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            (1..=5).map(|i| format!("S{}", i)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_prevalence_values() {
        let prev = feature_prevalence(&create_test_matrix());
        assert_eq!(prev, vec![1.0, 0.4, 0.2, 0.0]);
    }

    #[test]
    fn test_filter_threshold() {
        let filter = filter_prevalence_overall(&create_test_matrix(), 0.3).unwrap();
        // 0.3 of 5 samples rounds up to 2
        assert_eq!(filter.kept, vec![0, 1]);
        assert_eq!(filter.summary.n_removed, 2);
        assert!(filter.summary.to_string().contains("30.0%"));
    }

    #[test]
    fn test_threshold_met_exactly() {
        // 55 of 100 samples: 0.55 * 100 is 55.000000000000007 in floating point
        let row: Vec<f64> = (0..100).map(|i| if i < 55 { 1.0 } else { 0.0 }).collect();
        let matrix = AbundanceMatrix::from_rows(
            &[row],
            vec!["A".into()],
            (0..100).map(|i| format!("S{}", i)).collect(),
        )
        .unwrap();

        let filter = filter_prevalence_overall(&matrix, 0.55).unwrap();
        assert_eq!(filter.prevalence, vec![0.55]);
        assert_eq!(filter.kept, vec![0]);
        assert!(filter_prevalence_overall(&matrix, 0.56).unwrap().kept.is_empty());
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let filter = filter_prevalence_overall(&create_test_matrix(), 0.0).unwrap();
        assert_eq!(filter.kept, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(filter_prevalence_overall(&create_test_matrix(), 1.5).is_err());
        assert!(filter_prevalence_overall(&create_test_matrix(), -0.1).is_err());
    }
}
