//! Pipeline runner: load, curate, compute diversity, test, report.

use super::config::AnalysisConfig;
use crate::curate::{curate, Curation};
use crate::data::{DaResultSet, Dataset};
use crate::diversity::{compute_diversity, DiversityResults};
use crate::error::{MicrobiomeError, Result};
use crate::report::{write_report, GroupSizes, ReportContents, RunSummary};
use crate::test::{test_differential, DifferentialAnalysis};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, info_span, warn};

/// A stage of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Load,
    Curate,
    Diversity,
    Differential,
    Report,
}

impl Stage {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Curate => "curate",
            Self::Diversity => "diversity",
            Self::Differential => "differential",
            Self::Report => "report",
        }
    }
}

/// Everything produced by one run, before it is written out.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub name: String,
    pub dataset: Dataset,
    pub curation: Curation,
    pub diversity: DiversityResults,
    /// `None` when a group was empty and no comparison was possible.
    pub differential: Option<DifferentialAnalysis>,
    /// Reason the comparison was not run.
    pub differential_skipped: Option<String>,
}

impl AnalysisReport {
    /// Differential results, when the comparison ran.
    pub fn results(&self) -> Option<&DaResultSet> {
        self.differential.as_ref().map(|d| &d.results)
    }
}

/// Runs one [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    /// Create a runner, checking the configuration first.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load a YAML config file and create a runner.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::new(AnalysisConfig::from_yaml_file(path)?)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the configured inputs and analyse them.
    pub fn run(&self) -> Result<AnalysisReport> {
        let dataset = {
            let _span = info_span!("stage", name = Stage::Load.name()).entered();
            Dataset::load(&self.config.inputs, &self.config.loader)?
        };
        self.analyse(dataset)
    }

    /// Analyse an already joined dataset (labels are attached here).
    pub fn analyse(&self, dataset: Dataset) -> Result<AnalysisReport> {
        info!(name = %self.config.name, "starting analysis");

        let curation = {
            let _span = info_span!("stage", name = Stage::Curate.name()).entered();
            curate(dataset.metadata(), &self.config.curation)?
        };
        let dataset = dataset.attach_labels(curation.labels.clone())?;

        let diversity = {
            let _span = info_span!("stage", name = Stage::Diversity.name()).entered();
            compute_diversity(&dataset, &self.config.diversity)?
        };

        // Without both groups there is nothing to compare; diversity is
        // still reported and the reason goes into the run summary.
        let (differential, differential_skipped) = match dataset.group_indices() {
            Ok(_) => {
                let _span = info_span!("stage", name = Stage::Differential.name()).entered();
                (Some(test_differential(&dataset, &self.config.differential)?), None)
            }
            Err(MicrobiomeError::InsufficientData(reason)) => {
                warn!(%reason, "skipping differential abundance");
                (None, Some(reason))
            }
            Err(e) => return Err(e),
        };

        Ok(AnalysisReport {
            name: self.config.name.clone(),
            dataset,
            curation,
            diversity,
            differential,
            differential_skipped,
        })
    }

    /// Write the report into the configured output directory.
    pub fn write(&self, report: &AnalysisReport) -> Result<Vec<PathBuf>> {
        let _span = info_span!("stage", name = Stage::Report.name()).entered();
        let contents = ReportContents {
            dataset: &report.dataset,
            curation: &report.curation,
            alpha: report.diversity.alpha.as_ref(),
            beta: &report.diversity.beta,
            differential: report.results(),
        };
        write_report(&self.config.output.directory, contents, self.summary(report))
    }

    /// Run and write in one go.
    pub fn run_and_write(&self) -> Result<(AnalysisReport, Vec<PathBuf>)> {
        let report = self.run()?;
        let written = self.write(&report)?;
        Ok((report, written))
    }

    fn summary(&self, report: &AnalysisReport) -> RunSummary {
        let da = &self.config.differential;
        let diversity = &self.config.diversity;
        RunSummary {
            name: report.name.clone(),
            n_samples: report.dataset.n_samples(),
            n_taxa: report.dataset.n_features(),
            curation: report.curation.summary.clone(),
            alpha_metrics: diversity.alpha.iter().map(|m| m.name().to_string()).collect(),
            beta_metrics: diversity.beta.iter().map(|m| m.name().to_string()).collect(),
            transform: da.transform.name().to_string(),
            test: da.test.name().to_string(),
            correction: da.correction.name().to_string(),
            seed: da.seed,
            group_sizes: report.differential.as_ref().map(|d| GroupSizes {
                coffee: d.group_sizes.0,
                no_coffee: d.group_sizes.1,
            }),
            filter: report.differential.as_ref().map(|d| d.filter.clone()),
            results: report.results().map(DaResultSet::summary),
            differential_skipped: report.differential_skipped.clone(),
            outputs: Vec::new(),
        }
    }
}
