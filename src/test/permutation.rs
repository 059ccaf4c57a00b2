//! Permutation test on the difference in group means.
//!
//! # Algorithm
//!
//! 1. Compute the observed difference mean(coffee) - mean(no-coffee)
//! 2. Shuffle the pooled values `n_permutations` times
//! 3. Recompute the difference for each shuffle
//! 4. P-value = (1 + #|permuted| >= |observed|) / (1 + n_permutations)

use crate::error::{MicrobiomeError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Relative tolerance when comparing permuted and observed statistics.
const TOLERANCE: f64 = 1e-12;

/// Result of a permutation test for a single taxon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    /// Observed mean difference.
    pub observed: f64,
    /// Two-sided permutation p-value.
    pub p_value: f64,
    /// Number of permutations used.
    pub n_permutations: usize,
    /// Number of permutations with |stat| >= |observed|.
    pub n_extreme: usize,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Two-sided permutation test of `x` against `y`.
///
/// The same `seed` always produces the same p-value.
pub fn test_permutation(
    x: &[f64],
    y: &[f64],
    n_permutations: usize,
    seed: u64,
) -> Result<PermutationResult> {
    if x.is_empty() || y.is_empty() {
        return Err(MicrobiomeError::InsufficientData(format!(
            "permutation test needs observations in both groups (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if n_permutations == 0 {
        return Err(MicrobiomeError::InvalidParameter(
            "n_permutations must be at least 1".to_string(),
        ));
    }

    let mut pooled: Vec<f64> = x.iter().chain(y).copied().collect();
    if pooled.iter().all(|&v| v == pooled[0]) {
        return Err(MicrobiomeError::InsufficientData(
            "all values are tied".to_string(),
        ));
    }

    let observed = mean(x) - mean(y);
    let threshold = observed.abs() * (1.0 - TOLERANCE);
    let n1 = x.len();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut n_extreme = 0;
    for _ in 0..n_permutations {
        pooled.shuffle(&mut rng);
        let stat = mean(&pooled[..n1]) - mean(&pooled[n1..]);
        if stat.abs() >= threshold {
            n_extreme += 1;
        }
    }

    Ok(PermutationResult {
        observed,
        p_value: (n_extreme as f64 + 1.0) / (n_permutations as f64 + 1.0),
        n_permutations,
        n_extreme,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_with_seed() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let a = test_permutation(&x, &y, 500, 42).unwrap();
        let b = test_permutation(&x, &y, 500, 42).unwrap();
        assert_eq!(a, b);
        assert!((a.observed - (3.0 - 5.5)).abs() < 1e-12);
    }

    #[test]
    fn test_p_value_bounds() {
        let x = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let y = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let result = test_permutation(&x, &y, 999, 7).unwrap();
        assert!(result.p_value >= 1.0 / 1000.0);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_no_difference_large_p() {
        let x = [1.0, 4.0, 2.0, 3.0];
        let y = [2.0, 3.0, 1.0, 4.0];
        let result = test_permutation(&x, &y, 200, 1).unwrap();
        // Observed difference is zero, so every permutation is as extreme
        assert_eq!(result.n_extreme, 200);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(test_permutation(&[1.0, 1.0], &[1.0], 10, 0).is_err());
        assert!(test_permutation(&[], &[1.0], 10, 0).is_err());
        assert!(test_permutation(&[1.0], &[2.0], 0, 0).is_err());
    }
}
