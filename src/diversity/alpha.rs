//! Within-sample (alpha) diversity.

use crate::data::AbundanceMatrix;
use crate::diversity::tree::TaxonomyTree;
use crate::error::{MicrobiomeError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Alpha diversity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphaMetric {
    /// Number of observed (non-zero) taxa.
    Richness,
    /// Shannon entropy, natural log.
    Shannon,
    /// Gini-Simpson index 1 - Σp².
    Simpson,
    /// Inverse Simpson 1 / Σp².
    InverseSimpson,
    /// Chao1 richness estimator (integer counts only).
    Chao1,
    /// Faith's phylogenetic diversity (needs a taxonomy tree).
    FaithPd,
}

impl AlphaMetric {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Richness => "richness",
            Self::Shannon => "shannon",
            Self::Simpson => "simpson",
            Self::InverseSimpson => "inverse-simpson",
            Self::Chao1 => "chao1",
            Self::FaithPd => "faith-pd",
        }
    }

    /// True when the metric needs a taxonomy tree.
    pub fn needs_tree(&self) -> bool {
        matches!(self, Self::FaithPd)
    }
}

impl std::fmt::Display for AlphaMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute one alpha index for a single sample.
///
/// Returns `None` for a sample with zero total abundance, except for
/// richness and Faith's PD which are 0 for an empty sample.
pub fn alpha_value(
    metric: AlphaMetric,
    abundances: &[f64],
    tree: Option<&TaxonomyTree>,
    sample_id: &str,
) -> Result<Option<f64>> {
    let total: f64 = abundances.iter().sum();
    let observed = abundances.iter().filter(|&&v| v > 0.0).count() as f64;

    match metric {
        AlphaMetric::Richness => Ok(Some(observed)),
        AlphaMetric::FaithPd => {
            let tree = tree.ok_or_else(|| {
                MicrobiomeError::InvalidParameter(
                    "faith-pd requires a taxonomy table to build the tree".to_string(),
                )
            })?;
            tree.faith_pd(abundances).map(Some)
        }
        _ if total <= 0.0 => Ok(None),
        AlphaMetric::Shannon => {
            let h: f64 = abundances
                .iter()
                .filter(|&&v| v > 0.0)
                .map(|&v| {
                    let p = v / total;
                    -p * p.ln()
                })
                .sum();
            Ok(Some(non_negative(h)))
        }
        AlphaMetric::Simpson => {
            Ok(Some(non_negative(1.0 - sum_squared_proportions(abundances, total))))
        }
        AlphaMetric::InverseSimpson => Ok(Some(1.0 / sum_squared_proportions(abundances, total))),
        AlphaMetric::Chao1 => {
            if let Some(&bad) = abundances.iter().find(|v| v.fract() != 0.0) {
                return Err(MicrobiomeError::InvalidParameter(format!(
                    "chao1 needs integer counts but sample '{}' has abundance {}",
                    sample_id, bad
                )));
            }
            let f1 = abundances.iter().filter(|&&v| v == 1.0).count() as f64;
            let f2 = abundances.iter().filter(|&&v| v == 2.0).count() as f64;
            let estimate = if f2 > 0.0 {
                observed + (f1 * f1) / (2.0 * f2)
            } else {
                observed + f1 * (f1 - 1.0) / 2.0
            };
            Ok(Some(estimate))
        }
    }
}

/// Clamp to `+0.0`; a single-taxon sample otherwise yields `-0`.
fn non_negative(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

fn sum_squared_proportions(abundances: &[f64], total: f64) -> f64 {
    abundances
        .iter()
        .map(|&v| {
            let p = v / total;
            p * p
        })
        .sum()
}

/// Values of one alpha index for every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaResult {
    pub metric: AlphaMetric,
    /// One entry per sample; `None` is the empty-sample sentinel.
    pub values: Vec<Option<f64>>,
}

/// Alpha diversity of every sample for a set of indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaTable {
    pub sample_ids: Vec<String>,
    pub results: Vec<AlphaResult>,
}

impl AlphaTable {
    /// Value of `metric` for `sample_id`; outer `None` when either is unknown.
    pub fn get(&self, metric: AlphaMetric, sample_id: &str) -> Option<Option<f64>> {
        let col = self.sample_ids.iter().position(|s| s == sample_id)?;
        self.results
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.values[col])
    }

    /// Metrics in column order.
    pub fn metrics(&self) -> Vec<AlphaMetric> {
        self.results.iter().map(|r| r.metric).collect()
    }
}

/// Compute alpha diversity for every sample of `matrix`.
///
/// With `parallel` the samples are processed with rayon; the result order is
/// the matrix sample order either way.
pub fn alpha_diversity(
    matrix: &AbundanceMatrix,
    metrics: &[AlphaMetric],
    tree: Option<&TaxonomyTree>,
    parallel: bool,
) -> Result<AlphaTable> {
    if metrics.is_empty() {
        return Err(MicrobiomeError::InvalidParameter(
            "at least one alpha metric must be requested".to_string(),
        ));
    }
    if tree.is_none() {
        if let Some(m) = metrics.iter().find(|m| m.needs_tree()) {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "{} requires a taxonomy table to build the tree",
                m
            )));
        }
    }

    let dense = matrix.to_dense();
    let sample_ids = matrix.sample_ids();
    let compute = |col: usize| -> Result<Vec<Option<f64>>> {
        let column: Vec<f64> = dense.column(col).iter().copied().collect();
        metrics
            .iter()
            .map(|&m| alpha_value(m, &column, tree, &sample_ids[col]))
            .collect()
    };

    let per_sample: Vec<Vec<Option<f64>>> = if parallel {
        (0..matrix.n_samples()).into_par_iter().map(compute).collect::<Result<_>>()?
    } else {
        (0..matrix.n_samples()).map(compute).collect::<Result<_>>()?
    };

    let results = metrics
        .iter()
        .enumerate()
        .map(|(k, &metric)| AlphaResult {
            metric,
            values: per_sample.iter().map(|row| row[k]).collect(),
        })
        .collect();

    Ok(AlphaTable {
        sample_ids: sample_ids.to_vec(),
        results,
    })
}
