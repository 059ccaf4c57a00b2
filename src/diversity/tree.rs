//! Rooted tree derived from taxon lineages, for Faith's PD and UniFrac.
//!
//! Each resolved rank is an internal node with unit branch length. A
//! feature becomes a leaf below its deepest resolved rank, with a branch
//! spanning the ranks it leaves unresolved, so every leaf sits at the same
//! depth. Nodes are created parents first, which makes descending index
//! order a valid postorder.

use crate::data::{Taxon, RANKS};
use crate::error::{MicrobiomeError, Result};
use std::collections::HashMap;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<usize>,
    branch_length: f64,
}

/// Taxonomy-derived tree with one leaf per feature.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    nodes: Vec<TreeNode>,
    /// Leaf node for each feature, in feature order.
    leaves: Vec<usize>,
}

impl TaxonomyTree {
    /// Build the tree for `taxa` (one per feature, in feature order).
    ///
    /// Fails when no taxon has a resolved rank: such a tree carries no
    /// phylogenetic information.
    pub fn from_taxa(taxa: &[Taxon]) -> Result<Self> {
        if taxa.iter().all(Taxon::is_unresolved) {
            return Err(MicrobiomeError::InsufficientData(
                "tree-based metrics need a taxonomy with at least one resolved lineage".to_string(),
            ));
        }

        let mut nodes = vec![TreeNode {
            parent: None,
            branch_length: 0.0,
        }];
        let mut internal: HashMap<String, usize> = HashMap::new();
        let mut leaves = Vec::with_capacity(taxa.len());

        for taxon in taxa {
            let mut current = ROOT;
            let mut path = String::new();
            let depth = taxon.depth();
            for rank in 0..depth {
                if let Some(name) = taxon.rank(rank) {
                    path.push_str(name);
                    path.push(';');
                }
                current = *internal.entry(path.clone()).or_insert_with(|| {
                    nodes.push(TreeNode {
                        parent: Some(current),
                        branch_length: 1.0,
                    });
                    nodes.len() - 1
                });
            }
            nodes.push(TreeNode {
                parent: Some(current),
                branch_length: 1.0 + (RANKS.len() - depth) as f64,
            });
            leaves.push(nodes.len() - 1);
        }

        Ok(Self { nodes, leaves })
    }

    /// Total number of nodes, root included.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves (features).
    pub fn n_leaves(&self) -> usize {
        self.leaves.len()
    }

    fn check_len(&self, abundances: &[f64]) -> Result<()> {
        if abundances.len() != self.leaves.len() {
            return Err(MicrobiomeError::DimensionMismatch {
                expected: self.leaves.len(),
                actual: abundances.len(),
            });
        }
        Ok(())
    }

    /// Mark every node with an abundant leaf below it.
    fn presence(&self, abundances: &[f64]) -> Vec<bool> {
        let mut present = vec![false; self.nodes.len()];
        for (&leaf, &value) in self.leaves.iter().zip(abundances) {
            present[leaf] = value > 0.0;
        }
        for id in (1..self.nodes.len()).rev() {
            if present[id] {
                if let Some(parent) = self.nodes[id].parent {
                    present[parent] = true;
                }
            }
        }
        present
    }

    /// Proportion of the sample below every node.
    fn proportions(&self, abundances: &[f64]) -> Vec<f64> {
        let total: f64 = abundances.iter().sum();
        let mut props = vec![0.0; self.nodes.len()];
        if total <= 0.0 {
            return props;
        }
        for (&leaf, &value) in self.leaves.iter().zip(abundances) {
            props[leaf] = value / total;
        }
        for id in (1..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[id].parent {
                props[parent] += props[id];
            }
        }
        props
    }

    /// Faith's phylogenetic diversity: branch length connecting the
    /// observed features to the root. Zero for an empty sample.
    pub fn faith_pd(&self, abundances: &[f64]) -> Result<f64> {
        self.check_len(abundances)?;
        let present = self.presence(abundances);
        Ok((1..self.nodes.len())
            .filter(|&id| present[id])
            .map(|id| self.nodes[id].branch_length)
            .sum())
    }

    /// Unweighted UniFrac: unique branch length over observed branch length.
    pub fn unweighted_unifrac(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        self.check_len(a)?;
        self.check_len(b)?;
        let in_a = self.presence(a);
        let in_b = self.presence(b);

        let mut unique = 0.0;
        let mut observed = 0.0;
        for id in 1..self.nodes.len() {
            if in_a[id] || in_b[id] {
                let bl = self.nodes[id].branch_length;
                observed += bl;
                if in_a[id] != in_b[id] {
                    unique += bl;
                }
            }
        }
        if observed == 0.0 {
            return Ok(0.0);
        }
        Ok(unique / observed)
    }

    /// Normalised weighted UniFrac on relative abundances.
    pub fn weighted_unifrac(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        self.check_len(a)?;
        self.check_len(b)?;
        let prop_a = self.proportions(a);
        let prop_b = self.proportions(b);

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for id in 1..self.nodes.len() {
            let bl = self.nodes[id].branch_length;
            numerator += bl * (prop_a[id] - prop_b[id]).abs();
            denominator += bl * (prop_a[id] + prop_b[id]);
        }
        if denominator == 0.0 {
            return Ok(0.0);
        }
        Ok((numerator / denominator).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn taxa() -> Vec<Taxon> {
        vec![
            Taxon::from_lineage("A", "k__Bacteria;p__Firmicutes;c__Clostridia", ';'),
            Taxon::from_lineage("B", "k__Bacteria;p__Firmicutes;c__Bacilli", ';'),
            Taxon::from_lineage("C", "k__Bacteria;p__Bacteroidetes", ';'),
            Taxon::unresolved("D"),
        ]
    }

    #[test]
    fn test_structure() {
        let tree = TaxonomyTree::from_taxa(&taxa()).unwrap();
        // root, Bacteria, Firmicutes, Clostridia, leaf A, Bacilli, leaf B,
        // Bacteroidetes, leaf C, leaf D
        assert_eq!(tree.n_nodes(), 10);
        assert_eq!(tree.n_leaves(), 4);
        // Internal: 1+1+1+1+1 = 5; leaves: A 5, B 5, C 6, D 8
        assert_relative_eq!(tree.faith_pd(&[1.0, 1.0, 1.0, 1.0]).unwrap(), 29.0);
    }

    #[test]
    fn test_faith_pd() {
        let tree = TaxonomyTree::from_taxa(&taxa()).unwrap();
        // A alone: Bacteria + Firmicutes + Clostridia + leaf(5)
        assert_relative_eq!(tree.faith_pd(&[3.0, 0.0, 0.0, 0.0]).unwrap(), 8.0);
        // A and B share Bacteria and Firmicutes
        assert_relative_eq!(tree.faith_pd(&[3.0, 1.0, 0.0, 0.0]).unwrap(), 14.0);
        assert_relative_eq!(tree.faith_pd(&[1.0, 1.0, 1.0, 1.0]).unwrap(), 29.0);
        assert_eq!(tree.faith_pd(&[0.0; 4]).unwrap(), 0.0);
    }

    #[test]
    fn test_unifrac_bounds() {
        let tree = TaxonomyTree::from_taxa(&taxa()).unwrap();
        let a = [4.0, 0.0, 1.0, 0.0];
        let b = [0.0, 2.0, 1.0, 3.0];

        let u = tree.unweighted_unifrac(&a, &b).unwrap();
        assert!(u > 0.0 && u < 1.0);
        assert_relative_eq!(u, tree.unweighted_unifrac(&b, &a).unwrap());
        assert_eq!(tree.unweighted_unifrac(&a, &a).unwrap(), 0.0);

        let w = tree.weighted_unifrac(&a, &b).unwrap();
        assert!(w > 0.0 && w <= 1.0);
        assert_relative_eq!(tree.weighted_unifrac(&a, &[8.0, 0.0, 2.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_unifrac_empty_samples() {
        let tree = TaxonomyTree::from_taxa(&taxa()).unwrap();
        let empty = [0.0; 4];
        let full = [1.0, 0.0, 0.0, 0.0];
        assert_eq!(tree.unweighted_unifrac(&empty, &empty).unwrap(), 0.0);
        assert_eq!(tree.unweighted_unifrac(&empty, &full).unwrap(), 1.0);
        assert_eq!(tree.weighted_unifrac(&empty, &empty).unwrap(), 0.0);
        assert_eq!(tree.weighted_unifrac(&full, &empty).unwrap(), 1.0);
    }

    #[test]
    fn test_all_unresolved_rejected() {
        let taxa = vec![Taxon::unresolved("A"), Taxon::unresolved("B")];
        assert!(TaxonomyTree::from_taxa(&taxa).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let tree = TaxonomyTree::from_taxa(&taxa()).unwrap();
        assert!(tree.faith_pd(&[1.0]).is_err());
    }
}
