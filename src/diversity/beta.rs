//! Between-sample (beta) diversity as symmetric distance matrices.

use crate::data::AbundanceMatrix;
use crate::diversity::tree::TaxonomyTree;
use crate::error::{MicrobiomeError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Beta diversity distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BetaMetric {
    /// 1 - 2·Σmin(a,b) / (Σa + Σb).
    BrayCurtis,
    /// Presence/absence Jaccard distance.
    Jaccard,
    /// Unweighted UniFrac over the taxonomy tree.
    UnweightedUnifrac,
    /// Normalised weighted UniFrac over the taxonomy tree.
    WeightedUnifrac,
}

impl BetaMetric {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BrayCurtis => "bray-curtis",
            Self::Jaccard => "jaccard",
            Self::UnweightedUnifrac => "unweighted-unifrac",
            Self::WeightedUnifrac => "weighted-unifrac",
        }
    }

    /// True when the metric needs a taxonomy tree.
    pub fn needs_tree(&self) -> bool {
        matches!(self, Self::UnweightedUnifrac | Self::WeightedUnifrac)
    }
}

impl std::fmt::Display for BetaMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bray-Curtis dissimilarity. Two empty samples are at distance 0.
pub fn bray_curtis(a: &[f64], b: &[f64]) -> f64 {
    let sum_a: f64 = a.iter().sum();
    let sum_b: f64 = b.iter().sum();
    if sum_a + sum_b == 0.0 {
        return 0.0;
    }
    let sum_min: f64 = a.iter().zip(b).map(|(&x, &y)| x.min(y)).sum();
    (1.0 - 2.0 * sum_min / (sum_a + sum_b)).clamp(0.0, 1.0)
}

/// Jaccard distance on presence/absence. Two empty samples are at distance 0.
pub fn jaccard(a: &[f64], b: &[f64]) -> f64 {
    let mut intersection = 0usize;
    let mut union = 0usize;
    for (&x, &y) in a.iter().zip(b) {
        let (pa, pb) = (x > 0.0, y > 0.0);
        if pa || pb {
            union += 1;
        }
        if pa && pb {
            intersection += 1;
        }
    }
    if union == 0 {
        return 0.0;
    }
    1.0 - intersection as f64 / union as f64
}

/// Pairwise distances between a set of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub metric: BetaMetric,
    pub sample_ids: Vec<String>,
    /// Symmetric, zero diagonal.
    pub distances: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    /// Distance between two samples by identifier.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.sample_ids.iter().position(|s| s == a)?;
        let j = self.sample_ids.iter().position(|s| s == b)?;
        Some(self.distances[(i, j)])
    }
}

/// Compute a beta diversity matrix.
///
/// `subset` restricts the matrix to the listed samples, in the given order;
/// every listed id must exist. Each unordered pair is computed once and the
/// results are written back by index, so `parallel` does not change output.
pub fn beta_diversity(
    matrix: &AbundanceMatrix,
    metric: BetaMetric,
    tree: Option<&TaxonomyTree>,
    subset: Option<&[String]>,
    parallel: bool,
) -> Result<DistanceMatrix> {
    if metric.needs_tree() && tree.is_none() {
        return Err(MicrobiomeError::InvalidParameter(format!(
            "{} requires a taxonomy table to build the tree",
            metric
        )));
    }

    let columns: Vec<usize> = match subset {
        Some(ids) => ids
            .iter()
            .map(|id| {
                matrix.sample_index(id).ok_or_else(|| {
                    MicrobiomeError::missing_sample(id, "requested subset", "abundance")
                })
            })
            .collect::<Result<_>>()?,
        None => (0..matrix.n_samples()).collect(),
    };
    let n = columns.len();

    let dense = matrix.to_dense();
    let vectors: Vec<Vec<f64>> = columns
        .iter()
        .map(|&c| dense.column(c).iter().copied().collect())
        .collect();

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();
    let distance = |&(i, j): &(usize, usize)| -> Result<f64> {
        let (a, b) = (&vectors[i], &vectors[j]);
        match (metric, tree) {
            (BetaMetric::BrayCurtis, _) => Ok(bray_curtis(a, b)),
            (BetaMetric::Jaccard, _) => Ok(jaccard(a, b)),
            (BetaMetric::UnweightedUnifrac, Some(t)) => t.unweighted_unifrac(a, b),
            (BetaMetric::WeightedUnifrac, Some(t)) => t.weighted_unifrac(a, b),
            (_, None) => Err(MicrobiomeError::InvalidParameter(format!(
                "{} requires a taxonomy tree",
                metric
            ))),
        }
    };

    let values: Vec<f64> = if parallel {
        pairs.par_iter().map(distance).collect::<Result<_>>()?
    } else {
        pairs.iter().map(distance).collect::<Result<_>>()?
    };

    let mut distances = DMatrix::zeros(n, n);
    for (&(i, j), d) in pairs.iter().zip(values) {
        distances[(i, j)] = d;
        distances[(j, i)] = d;
    }

    Ok(DistanceMatrix {
        metric,
        sample_ids: columns
            .iter()
            .map(|&c| matrix.sample_ids()[c].clone())
            .collect(),
        distances,
    })
}
