//! Differential abundance testing between the coffee and no-coffee groups.
//!
//! Per taxon: select by prevalence over the grouped samples, transform,
//! run a two-group test, then correct all defined p-values together. A
//! taxon whose test cannot be carried out gets a null result with a reason;
//! only run-level problems (no samples in a group) abort.

pub mod permutation;
pub mod rank_sum;

pub use permutation::{test_permutation, PermutationResult};
pub use rank_sum::{RankSumResult, RankSumTest};

use crate::correct::Correction;
use crate::data::{DaResult, DaResultSet, Dataset, CONTRAST};
use crate::error::{MicrobiomeError, Result};
use crate::filter::{filter_prevalence_overall, FilterResult};
use crate::normalize::Transform;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Two-group test applied to each taxon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum TestMethod {
    /// Wilcoxon rank-sum / Mann-Whitney U.
    RankSum,
    /// Permutation test on the difference in means.
    Permutation { n_permutations: usize },
}

impl TestMethod {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RankSum => "rank-sum",
            Self::Permutation { .. } => "permutation",
        }
    }
}

/// Differential abundance settings. Every field must be given explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaConfig {
    /// Minimum fraction of grouped samples a taxon must be present in.
    pub min_prevalence: f64,
    pub transform: Transform,
    pub test: TestMethod,
    pub correction: Correction,
    /// Seed for resampling tests; taxon `i` uses `seed + i`.
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool,
}

impl DaConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_prevalence) {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "min_prevalence must be between 0 and 1, got {}",
                self.min_prevalence
            )));
        }
        if let TestMethod::Permutation { n_permutations: 0 } = self.test {
            return Err(MicrobiomeError::InvalidParameter(
                "n_permutations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Test results plus the prevalence filter that selected the taxa.
#[derive(Debug, Clone)]
pub struct DifferentialAnalysis {
    pub results: DaResultSet,
    pub filter: FilterResult,
    /// Sizes of the coffee and no-coffee groups.
    pub group_sizes: (usize, usize),
}

struct TaxonOutcome {
    statistic: Option<f64>,
    p_value: Option<f64>,
    failure: Option<String>,
}

/// Run the differential abundance test on a labelled dataset.
pub fn test_differential(dataset: &Dataset, config: &DaConfig) -> Result<DifferentialAnalysis> {
    config.validate()?;
    let (coffee, no_coffee) = dataset.group_indices()?;
    let (n1, n2) = (coffee.len(), no_coffee.len());
    info!(coffee = n1, no_coffee = n2, "two-group comparison");

    // Only the grouped samples take part: coffee columns first.
    let grouped: Vec<usize> = coffee.iter().chain(&no_coffee).copied().collect();
    let matrix = dataset.abundance().subset_samples(&grouped)?;

    let filter = filter_prevalence_overall(&matrix, config.min_prevalence)?;
    info!(
        tested = filter.summary.n_after,
        removed = filter.summary.n_removed,
        min_prevalence = config.min_prevalence,
        "prevalence filter"
    );
    if filter.kept.is_empty() {
        warn!("no taxon passes the prevalence filter, nothing to test");
    }

    let transformed = config.transform.apply(&matrix)?;
    let row_nnz = matrix.row_nnz();
    let rank_sum = match config.test {
        TestMethod::RankSum => Some(RankSumTest::new(n1, n2)?),
        TestMethod::Permutation { .. } => None,
    };

    let run_one = |&row: &usize| -> (f64, f64, TaxonOutcome) {
        let values = transformed.row(row);
        let (x, y) = values.split_at(n1);
        let mean_x = x.iter().sum::<f64>() / n1 as f64;
        let mean_y = y.iter().sum::<f64>() / n2 as f64;

        let outcome = if row_nnz[row] == 0 {
            Err(MicrobiomeError::InsufficientData(
                "no non-zero observation in either group".to_string(),
            ))
        } else {
            match (&config.test, &rank_sum) {
                (TestMethod::RankSum, Some(test)) => test.test(x, y).map(|r| (r.u, r.p_value)),
                (TestMethod::Permutation { n_permutations }, _) => {
                    test_permutation(x, y, *n_permutations, config.seed.wrapping_add(row as u64))
                        .map(|r| (r.observed, r.p_value))
                }
                (TestMethod::RankSum, None) => Err(MicrobiomeError::Pipeline(
                    "rank-sum test was not prepared".to_string(),
                )),
            }
        };

        let outcome = match outcome {
            Ok((statistic, p)) => TaxonOutcome {
                statistic: Some(statistic),
                p_value: Some(p),
                failure: None,
            },
            Err(e) => {
                let reason = match e {
                    MicrobiomeError::InsufficientData(msg) => msg,
                    other => other.to_string(),
                };
                debug!(taxon = %dataset.feature_ids()[row], reason = %reason, "null result");
                TaxonOutcome {
                    statistic: None,
                    p_value: None,
                    failure: Some(reason),
                }
            }
        };
        (mean_x, mean_y, outcome)
    };

    let outcomes: Vec<(f64, f64, TaxonOutcome)> = if config.parallel {
        filter.kept.par_iter().map(run_one).collect()
    } else {
        filter.kept.iter().map(run_one).collect()
    };

    // Correct across the defined p-values only.
    let defined: Vec<f64> = outcomes.iter().filter_map(|(_, _, o)| o.p_value).collect();
    let mut adjusted = config.correction.adjust(&defined)?.into_iter();

    let taxa = dataset.taxa();
    let results: Vec<DaResult> = filter
        .kept
        .iter()
        .zip(outcomes)
        .map(|(&row, (mean_coffee, mean_no_coffee, outcome))| {
            let q_value = outcome.p_value.and_then(|_| adjusted.next());
            DaResult {
                taxon_id: dataset.feature_ids()[row].clone(),
                lineage: taxa[row].lineage_string(),
                contrast: CONTRAST.to_string(),
                method: config.test.name().to_string(),
                effect: mean_coffee - mean_no_coffee,
                mean_coffee,
                mean_no_coffee,
                statistic: outcome.statistic,
                prevalence: filter.prevalence[row],
                p_value: outcome.p_value,
                q_value,
                failure: outcome.failure,
            }
        })
        .collect();

    let nulls = results.iter().filter(|r| !r.is_defined()).count();
    if nulls > 0 {
        warn!(nulls, "taxa recorded with a null result");
    }

    Ok(DifferentialAnalysis {
        results: DaResultSet::new(
            config.test.name().to_string(),
            config.correction.name().to_string(),
            results,
        ),
        filter: filter.summary,
        group_sizes: (n1, n2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        AbundanceMatrix, GroupLabel, JoinPolicy, LoaderOptions, Metadata, TableFormat, Taxonomy,
    };

    fn dataset(rows: &[Vec<f64>], labels: Vec<GroupLabel>) -> Dataset {
        let n = labels.len();
        let sample_ids: Vec<String> = (1..=n).map(|i| format!("S{}", i)).collect();
        let feature_ids: Vec<String> = (1..=rows.len()).map(|i| format!("taxon{}", i)).collect();
        let abundance = AbundanceMatrix::from_rows(rows, feature_ids, sample_ids.clone()).unwrap();
        let mut content = String::from("id\tx\n");
        for id in &sample_ids {
            content.push_str(&format!("{}\t1\n", id));
        }
        let metadata = Metadata::from_table_str(&content, &TableFormat::tsv("id")).unwrap();
        let options = LoaderOptions::new(JoinPolicy::Strict);
        Dataset::join(abundance, &Taxonomy::new(), &metadata, &options)
            .unwrap()
            .attach_labels(labels)
            .unwrap()
    }

    fn config(test: TestMethod) -> DaConfig {
        DaConfig {
            min_prevalence: 0.0,
            transform: Transform::Relative,
            test,
            correction: Correction::BenjaminiHochberg,
            seed: 1,
            parallel: false,
        }
    }

    #[test]
    fn test_three_sample_scenario() {
        // Samples as columns: taxon1 = [10, 5, 0], taxon2 = [0, 5, 10]
        let ds = dataset(
            &[vec![10.0, 5.0, 0.0], vec![0.0, 5.0, 10.0]],
            vec![GroupLabel::Coffee, GroupLabel::Coffee, GroupLabel::NoCoffee],
        );
        let analysis = test_differential(&ds, &config(TestMethod::RankSum)).unwrap();
        let taxon2 = analysis.results.get("taxon2").unwrap();
        assert!(taxon2.p_value.is_some());
        assert!(taxon2.q_value.unwrap() >= taxon2.p_value.unwrap());
        assert!(taxon2.effect < 0.0);
        assert_eq!(taxon2.contrast, CONTRAST);
        assert_eq!(analysis.group_sizes, (2, 1));
    }

    #[test]
    fn test_unknown_samples_excluded() {
        let ds = dataset(
            &[vec![1.0, 2.0, 100.0, 3.0, 4.0]],
            vec![
                GroupLabel::Coffee,
                GroupLabel::Coffee,
                GroupLabel::Unknown,
                GroupLabel::NoCoffee,
                GroupLabel::NoCoffee,
            ],
        );
        let mut cfg = config(TestMethod::RankSum);
        cfg.transform = Transform::None;
        let analysis = test_differential(&ds, &cfg).unwrap();
        let r = &analysis.results.results[0];
        assert_eq!(r.mean_coffee, 1.5);
        assert_eq!(r.mean_no_coffee, 3.5);
    }

    #[test]
    fn test_zero_taxon_is_null_result() {
        let ds = dataset(
            &[vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 0.0, 0.0]],
            vec![
                GroupLabel::Coffee,
                GroupLabel::Coffee,
                GroupLabel::NoCoffee,
                GroupLabel::NoCoffee,
            ],
        );
        let analysis = test_differential(&ds, &config(TestMethod::RankSum)).unwrap();
        let zero = analysis.results.get("taxon2").unwrap();
        assert_eq!(zero.p_value, None);
        assert_eq!(zero.q_value, None);
        assert!(zero.failure.as_deref().unwrap().contains("non-zero"));
    }

    #[test]
    fn test_prevalence_filter_applies() {
        let ds = dataset(
            &[vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 0.0, 5.0]],
            vec![
                GroupLabel::Coffee,
                GroupLabel::Coffee,
                GroupLabel::NoCoffee,
                GroupLabel::NoCoffee,
            ],
        );
        let mut cfg = config(TestMethod::RankSum);
        cfg.min_prevalence = 0.5;
        let analysis = test_differential(&ds, &cfg).unwrap();
        assert_eq!(analysis.results.len(), 1);
        assert_eq!(analysis.filter.n_removed, 1);
    }

    #[test]
    fn test_missing_group_is_insufficient_data() {
        let ds = dataset(
            &[vec![1.0, 2.0]],
            vec![GroupLabel::Coffee, GroupLabel::Unknown],
        );
        let err = test_differential(&ds, &config(TestMethod::RankSum)).unwrap_err();
        assert!(matches!(err, MicrobiomeError::InsufficientData(_)));
    }

    #[test]
    fn test_permutation_parallel_deterministic() {
        let rows: Vec<Vec<f64>> = (0..6)
            .map(|t| (0..8).map(|s| ((t * 7 + s * 3) % 11) as f64 + 1.0).collect())
            .collect();
        let labels: Vec<GroupLabel> = (0..8)
            .map(|s| if s < 4 { GroupLabel::Coffee } else { GroupLabel::NoCoffee })
            .collect();
        let ds = dataset(&rows, labels);

        let mut sequential = config(TestMethod::Permutation { n_permutations: 199 });
        sequential.transform = Transform::Clr { pseudocount: 0.5 };
        let mut parallel = sequential.clone();
        parallel.parallel = true;

        let a = test_differential(&ds, &sequential).unwrap();
        let b = test_differential(&ds, &parallel).unwrap();
        assert_eq!(a.results, b.results);
    }

    #[test]
    fn test_invalid_config() {
        let mut cfg = config(TestMethod::Permutation { n_permutations: 0 });
        assert!(cfg.validate().is_err());
        cfg.test = TestMethod::RankSum;
        cfg.min_prevalence = 2.0;
        assert!(cfg.validate().is_err());
    }
}
