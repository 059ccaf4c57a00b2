//! Result types for differential abundance testing.

use serde::{Deserialize, Serialize};

/// The contrast every result is reported for.
pub const CONTRAST: &str = "coffee vs no-coffee";

/// Result for a single taxon from differential abundance testing.
///
/// A taxon whose test could not be carried out keeps its descriptive fields
/// but has no p-values and carries the reason in `failure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaResult {
    /// Taxon (feature) identifier.
    pub taxon_id: String,
    /// Lineage string, or `unresolved`.
    pub lineage: String,
    /// Contrast being tested.
    pub contrast: String,
    /// Test method name.
    pub method: String,
    /// Mean transformed abundance in the coffee group minus the no-coffee group.
    pub effect: f64,
    /// Mean transformed abundance in the coffee group.
    pub mean_coffee: f64,
    /// Mean transformed abundance in the no-coffee group.
    pub mean_no_coffee: f64,
    /// Test statistic (U for rank-sum, mean difference for permutation).
    pub statistic: Option<f64>,
    /// Fraction of grouped samples in which the taxon is non-zero.
    pub prevalence: f64,
    /// Raw p-value.
    pub p_value: Option<f64>,
    /// Adjusted p-value after multiple testing correction.
    pub q_value: Option<f64>,
    /// Why the taxon has no p-value.
    pub failure: Option<String>,
}

impl DaResult {
    /// True when the test produced a p-value.
    pub fn is_defined(&self) -> bool {
        self.p_value.is_some()
    }

    /// Check if this result is significant at the given threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.q_value.map(|q| q < alpha).unwrap_or(false)
    }
}

/// Collection of DA results, in taxon order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaResultSet {
    /// Method name used to generate these results.
    pub method: String,
    /// Correction method applied to the p-values.
    pub correction: String,
    /// Individual results for each tested taxon.
    pub results: Vec<DaResult>,
}

impl DaResultSet {
    /// Create a new result set.
    pub fn new(method: String, correction: String, results: Vec<DaResult>) -> Self {
        Self {
            method,
            correction,
            results,
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up the result for a taxon.
    pub fn get(&self, taxon_id: &str) -> Option<&DaResult> {
        self.results.iter().find(|r| r.taxon_id == taxon_id)
    }

    /// Defined results sorted by adjusted p-value (ascending), then taxon id.
    pub fn sorted_by_qvalue(&self) -> Vec<&DaResult> {
        let mut sorted: Vec<_> = self.results.iter().filter(|r| r.q_value.is_some()).collect();
        sorted.sort_by(|a, b| {
            a.q_value
                .unwrap_or(1.0)
                .total_cmp(&b.q_value.unwrap_or(1.0))
                .then_with(|| a.taxon_id.cmp(&b.taxon_id))
        });
        sorted
    }

    /// Get significant results at a threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&DaResult> {
        self.results
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Count results at various thresholds.
    pub fn summary(&self) -> ResultSummary {
        let count = |alpha: f64| self.results.iter().filter(|r| r.is_significant_at(alpha)).count();
        ResultSummary {
            total: self.len(),
            defined: self.results.iter().filter(|r| r.is_defined()).count(),
            significant_01: count(0.01),
            significant_05: count(0.05),
            significant_10: count(0.10),
        }
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &DaResult> {
        self.results.iter()
    }
}

/// Summary statistics for a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub defined: usize,
    pub significant_01: usize,
    pub significant_05: usize,
    pub significant_10: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Taxa tested:              {}", self.total)?;
        writeln!(f, "With a defined p-value:   {}", self.defined)?;
        writeln!(f, "Significant at q < 0.01:  {}", self.significant_01)?;
        writeln!(f, "Significant at q < 0.05:  {}", self.significant_05)?;
        writeln!(f, "Significant at q < 0.10:  {}", self.significant_10)?;
        Ok(())
    }
}
