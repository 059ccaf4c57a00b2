//! Diversity engine: alpha indices per sample and beta distances per pair.

pub mod alpha;
pub mod beta;
pub mod tree;

pub use alpha::{alpha_diversity, alpha_value, AlphaMetric, AlphaResult, AlphaTable};
pub use beta::{beta_diversity, bray_curtis, jaccard, BetaMetric, DistanceMatrix};
pub use tree::TaxonomyTree;

use crate::data::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which diversity metrics to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityConfig {
    pub alpha: Vec<AlphaMetric>,
    pub beta: Vec<BetaMetric>,
    /// Restrict beta matrices to these samples (all samples when absent).
    #[serde(default)]
    pub beta_subset: Option<Vec<String>>,
    #[serde(default)]
    pub parallel: bool,
}

impl DiversityConfig {
    /// True when any requested metric needs the taxonomy tree.
    pub fn needs_tree(&self) -> bool {
        self.alpha.iter().any(AlphaMetric::needs_tree)
            || self.beta.iter().any(BetaMetric::needs_tree)
    }
}

/// All diversity results of one run.
#[derive(Debug, Clone)]
pub struct DiversityResults {
    pub alpha: Option<AlphaTable>,
    pub beta: Vec<DistanceMatrix>,
}

/// Compute every configured metric for a dataset.
///
/// The taxonomy tree is built only when a tree metric is requested.
pub fn compute_diversity(dataset: &Dataset, config: &DiversityConfig) -> Result<DiversityResults> {
    let tree = if config.needs_tree() {
        let tree = TaxonomyTree::from_taxa(dataset.taxa())?;
        info!(nodes = tree.n_nodes(), leaves = tree.n_leaves(), "built taxonomy tree");
        Some(tree)
    } else {
        None
    };

    let alpha = if config.alpha.is_empty() {
        None
    } else {
        info!(
            metrics = config.alpha.len(),
            samples = dataset.n_samples(),
            "computing alpha diversity"
        );
        Some(alpha_diversity(
            dataset.abundance(),
            &config.alpha,
            tree.as_ref(),
            config.parallel,
        )?)
    };

    let mut beta = Vec::with_capacity(config.beta.len());
    for &metric in &config.beta {
        info!(metric = %metric, "computing beta diversity");
        beta.push(beta_diversity(
            dataset.abundance(),
            metric,
            tree.as_ref(),
            config.beta_subset.as_deref(),
            config.parallel,
        )?);
    }

    Ok(DiversityResults { alpha, beta })
}
