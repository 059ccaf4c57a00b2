//! YAML analysis configuration.

use crate::curate::CoffeeVocabulary;
use crate::data::{InputConfig, LoaderOptions};
use crate::diversity::DiversityConfig;
use crate::error::{MicrobiomeError, Result};
use crate::test::DaConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the report goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// One complete analysis run.
///
/// The vocabulary, join policy, metrics, transform, test, correction and
/// seed have no defaults: a config that omits them does not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub inputs: InputConfig,
    pub loader: LoaderOptions,
    pub curation: CoffeeVocabulary,
    pub diversity: DiversityConfig,
    pub differential: DaConfig,
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(MicrobiomeError::from)
    }

    /// Load from a YAML file. Relative input and output paths are taken
    /// relative to the file's directory.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::from_yaml(&std::fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            config.inputs.resolve_relative_to(base);
            if config.output.directory.is_relative() {
                config.output.directory = base.join(&config.output.directory);
            }
        }
        Ok(config)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(MicrobiomeError::from)
    }

    /// Check every section that can be checked before loading data.
    pub fn validate(&self) -> Result<()> {
        self.curation.validate()?;
        self.differential.validate()?;
        if self.diversity.alpha.is_empty() && self.diversity.beta.is_empty() {
            tracing::warn!("no diversity metric requested");
        }
        Ok(())
    }
}

/// Template written by `cgm example`. Every value marked EDIT must be
/// replaced with the study's own choices before running.
pub const EXAMPLE_CONFIG: &str = r##"# Coffee vs gut microbiome analysis (TEMPLATE)
#
# The vocabulary, metrics, test and thresholds below are placeholders.
# Replace every value marked EDIT with the choices for your study.
name: coffee-example
description: Template configuration; not a validated analysis
inputs:
  abundance:
    path: feature-table.tsv          # EDIT
    id_column: "#OTU ID"             # EDIT
    delimiter: "\t"
    skip_lines: 1                    # biom export banner line
    orientation: features-as-rows
  taxonomy:
    path: taxonomy.tsv               # EDIT
    id_column: Feature ID
    lineage_column: Taxon
    rank_separator: ";"
  metadata:
    path: metadata.tsv               # EDIT
    id_column: sample_name           # EDIT
loader:
  join: strict
  drop_empty_features: true
  drop_empty_samples: true
curation:
  field: coffee_frequency            # EDIT
  coffee:                            # EDIT
    - Daily
    - Regularly (3-5 times/week)
  no_coffee:                         # EDIT
    - Never
  unknown:
    - Not provided
    - Unspecified
  case_insensitive: true
diversity:
  alpha: [richness, shannon, faith-pd]      # EDIT
  beta: [bray-curtis, unweighted-unifrac]   # EDIT
  parallel: true
differential:
  min_prevalence: 0.1                # EDIT
  transform:
    kind: clr
    pseudocount: 0.5                 # EDIT
  test:
    kind: rank-sum                   # EDIT
  correction: benjamini-hochberg     # EDIT
  seed: 20240101                     # EDIT
  parallel: true
output:
  directory: coffee-results
"##;
