//! Coffee Consumption vs Gut Microbiome Analysis Library
//!
//! This library compares the gut microbiome of coffee drinkers and
//! non-drinkers from a taxon abundance table, a taxonomy table and per-sample
//! dietary metadata.
//!
//! # Overview
//!
//! The library is organized into modules that follow the analysis:
//!
//! - **data**: Core data structures (AbundanceMatrix, Taxonomy, Metadata, Dataset, Results)
//! - **curate**: Coffee-consumption vocabulary, group labelling and field discovery
//! - **profile**: Data profiling (sparsity, prevalence, library size)
//! - **diversity**: Alpha indices and beta distances, including tree-based metrics
//! - **filter**: Prevalence-based selection of taxa to test
//! - **zero**: Zero handling (pseudocount)
//! - **normalize**: Transformations (relative abundance, CLR)
//! - **test**: Two-group tests (rank-sum, permutation) and the per-taxon driver
//! - **correct**: Multiple testing correction (BH, Bonferroni, Holm)
//! - **report**: TSV and JSON outputs
//! - **pipeline**: YAML configuration and the end-to-end runner
//! - **simulate**: Seeded synthetic inputs shaped like American Gut exports
//!
//! # Example
//!
//! ```no_run
//! use coffee_microbiome::prelude::*;
//!
//! let pipeline = Pipeline::from_yaml_file("analysis.yaml").unwrap();
//! let report = pipeline.run().unwrap();
//! if let Some(results) = report.results() {
//!     println!("{}", results.summary());
//! }
//! pipeline.write(&report).unwrap();
//! ```

pub mod correct;
pub mod curate;
pub mod data;
pub mod diversity;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod simulate;
pub mod test;
pub mod zero;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correct::{adjust_bh, adjust_bonferroni, adjust_holm, Correction};
    pub use crate::curate::{
        curate, discover_coffee_fields, CoffeeVocabulary, Curation, CurationSummary,
        FieldCandidate, NumericRule,
    };
    pub use crate::data::{
        AbundanceMatrix, DaResult, DaResultSet, Dataset, GroupLabel, InputConfig, JoinPolicy,
        LoaderOptions, Metadata, Orientation, ResultSummary, Sample, TableFormat, Taxon, Taxonomy,
        TaxonomyFormat, Variable,
    };
    pub use crate::diversity::{
        alpha_diversity, beta_diversity, compute_diversity, AlphaMetric, AlphaTable, BetaMetric,
        DistanceMatrix, DiversityConfig, DiversityResults, TaxonomyTree,
    };
    pub use crate::error::{MicrobiomeError, Result};
    pub use crate::filter::{feature_prevalence, filter_prevalence_overall, FilterResult};
    pub use crate::normalize::{norm_clr, norm_tss, Transform, TransformedMatrix};
    pub use crate::pipeline::{AnalysisConfig, AnalysisReport, Pipeline, EXAMPLE_CONFIG};
    pub use crate::profile::{
        profile_library_size, profile_matrix, profile_prevalence, profile_sparsity, DataProfile,
        LibrarySizeProfile, PrevalenceProfile, SparsityProfile,
    };
    pub use crate::report::{write_report, RunSummary};
    pub use crate::simulate::{generate_synthetic, SimulationConfig, SyntheticData};
    pub use crate::test::{
        test_differential, test_permutation, DaConfig, DifferentialAnalysis, RankSumTest,
        TestMethod,
    };
    pub use crate::zero::add_pseudocount;
}
