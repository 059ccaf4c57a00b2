//! Wilcoxon rank-sum (Mann-Whitney U) test.
//!
//! Small samples without ties use the exact null distribution of U; larger
//! samples, or any ties, use the normal approximation with tie and
//! continuity corrections.

use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Both groups must be below this size for the exact distribution.
pub const EXACT_LIMIT: usize = 50;

/// Outcome of a rank-sum test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSumResult {
    /// U statistic of the first group.
    pub u: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// True when the exact null distribution was used.
    pub exact: bool,
}

/// Rank-sum test for fixed group sizes.
///
/// The exact null distribution depends only on the group sizes, so it is
/// computed once and reused for every taxon.
#[derive(Debug, Clone)]
pub struct RankSumTest {
    n1: usize,
    n2: usize,
    /// Cumulative frequencies of U = 0..=n1*n2 (exact case only).
    cumulative: Option<Vec<f64>>,
}

impl RankSumTest {
    /// Prepare the test for groups of `n1` and `n2` observations.
    pub fn new(n1: usize, n2: usize) -> Result<Self> {
        if n1 == 0 || n2 == 0 {
            return Err(MicrobiomeError::InsufficientData(format!(
                "rank-sum test needs observations in both groups (got {} and {})",
                n1, n2
            )));
        }
        let cumulative = (n1 < EXACT_LIMIT && n2 < EXACT_LIMIT).then(|| exact_cumulative(n1, n2));
        Ok(Self { n1, n2, cumulative })
    }

    /// Test whether `x` and `y` come from the same distribution.
    pub fn test(&self, x: &[f64], y: &[f64]) -> Result<RankSumResult> {
        if x.len() != self.n1 || y.len() != self.n2 {
            return Err(MicrobiomeError::DimensionMismatch {
                expected: self.n1 + self.n2,
                actual: x.len() + y.len(),
            });
        }

        let combined: Vec<f64> = x.iter().chain(y).copied().collect();
        if combined.iter().any(|v| !v.is_finite()) {
            return Err(MicrobiomeError::InvalidParameter(
                "rank-sum test received a non-finite value".to_string(),
            ));
        }
        let (ranks, tie_sizes) = average_ranks(&combined);

        let n = (self.n1 + self.n2) as f64;
        if tie_sizes.len() == 1 && tie_sizes[0] as f64 == n {
            return Err(MicrobiomeError::InsufficientData(
                "all values are tied".to_string(),
            ));
        }

        let (n1, n2) = (self.n1 as f64, self.n2 as f64);
        let r1: f64 = ranks[..self.n1].iter().sum();
        let u = r1 - n1 * (n1 + 1.0) / 2.0;

        let has_ties = tie_sizes.iter().any(|&t| t > 1);
        if let (false, Some(cumulative)) = (has_ties, &self.cumulative) {
            // U is integral without ties.
            let k = u.round() as usize;
            let total = cumulative[cumulative.len() - 1];
            let lower = cumulative[k] / total;
            let upper = if k == 0 {
                1.0
            } else {
                1.0 - cumulative[k - 1] / total
            };
            let p_value = (2.0 * lower.min(upper)).min(1.0);
            return Ok(RankSumResult {
                u,
                p_value,
                exact: true,
            });
        }

        let mean = n1 * n2 / 2.0;
        let tie_term: f64 = tie_sizes
            .iter()
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum();
        let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
        if variance <= 0.0 {
            return Err(MicrobiomeError::InsufficientData(
                "rank-sum variance is zero".to_string(),
            ));
        }
        let z = ((u - mean).abs() - 0.5).max(0.0) / variance.sqrt();
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| MicrobiomeError::InvalidParameter(format!("standard normal: {}", e)))?;
        let p_value = (2.0 * normal.sf(z)).min(1.0);

        Ok(RankSumResult {
            u,
            p_value,
            exact: false,
        })
    }
}

/// Average ranks (1-based) and the sizes of every run of equal values.
fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_sizes = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j share the average of ranks i+1..=j
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        tie_sizes.push(j - i);
        i = j;
    }
    (ranks, tie_sizes)
}

/// Cumulative frequencies of U for group sizes `m` and `n`.
///
/// The frequencies are the coefficients of the Gaussian binomial
/// [m+n choose m]_q, built as the product over i of (1 - q^(n+i)) / (1 - q^i).
/// Exact integer arithmetic keeps the far tails precise.
fn exact_cumulative(m: usize, n: usize) -> Vec<f64> {
    let max_u = m * n;
    let mut coeffs = vec![0i128; max_u + m + 1];
    coeffs[0] = 1;
    for i in 1..=m {
        // Multiply by (1 - q^(n+i))
        let k = n + i;
        for s in (k..coeffs.len()).rev() {
            coeffs[s] -= coeffs[s - k];
        }
        // Divide by (1 - q^i)
        for s in i..coeffs.len() {
            coeffs[s] += coeffs[s - i];
        }
    }

    let mut cumulative = Vec::with_capacity(max_u + 1);
    let mut running: i128 = 0;
    for &c in &coeffs[..=max_u] {
        running += c;
        cumulative.push(running as f64);
    }
    cumulative
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_distribution_counts() {
        // m = 2, n = 2: U frequencies 1,1,2,1,1 over C(4,2) = 6
        let cumulative = exact_cumulative(2, 2);
        assert_eq!(cumulative, vec![1.0, 2.0, 4.0, 5.0, 6.0]);
        // Total arrangements C(20,10)
        let cumulative = exact_cumulative(10, 10);
        assert_eq!(*cumulative.last().unwrap(), 184_756.0);
    }

    #[test]
    fn test_three_sample_scenario() {
        // Taxon 2 of the coffee scenario: coffee {0, 5}, no-coffee {10}
        let test = RankSumTest::new(2, 1).unwrap();
        let result = test.test(&[0.0, 5.0], &[10.0]).unwrap();
        assert!(result.exact);
        assert_relative_eq!(result.u, 0.0);
        assert_relative_eq!(result.p_value, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complete_separation_exact() {
        let test = RankSumTest::new(5, 5).unwrap();
        let result = test
            .test(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0])
            .unwrap();
        // P(U = 0) = 1 / C(10,5), two-sided
        assert_relative_eq!(result.p_value, 2.0 / 252.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ties_use_normal_approximation() {
        let test = RankSumTest::new(4, 4).unwrap();
        let result = test
            .test(&[0.0, 0.0, 1.0, 2.0], &[0.0, 3.0, 4.0, 5.0])
            .unwrap();
        assert!(!result.exact);
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn test_large_groups_normal() {
        let x: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..60).map(|i| i as f64 + 30.5).collect();
        let test = RankSumTest::new(60, 60).unwrap();
        let result = test.test(&x, &y).unwrap();
        assert!(!result.exact);
        assert!(result.p_value < 1e-4);
    }

    #[test]
    fn test_all_tied_is_degenerate() {
        let test = RankSumTest::new(2, 2).unwrap();
        let err = test.test(&[0.0, 0.0], &[0.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("tied"));
    }

    #[test]
    fn test_identical_groups_p_one() {
        let test = RankSumTest::new(3, 3).unwrap();
        let result = test.test(&[1.0, 4.0, 5.0], &[2.0, 3.0, 6.0]).unwrap();
        // Ranks 1, 4, 5 -> R1 = 10, U = 4, close to the null mean 4.5
        assert_relative_eq!(result.u, 4.0);
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(RankSumTest::new(0, 3).is_err());
    }
}
