//! Tabular and JSON outputs of an analysis run.
//!
//! All tables are tab-separated with a header row. Undefined values (a
//! diversity index of an empty sample, the p-value of an untestable taxon)
//! are written as `NA`. Identifiers are written exactly as loaded.

use crate::curate::{Curation, CurationSummary};
use crate::data::{DaResultSet, Dataset, GroupLabel, ResultSummary};
use crate::diversity::{AlphaTable, DistanceMatrix};
use crate::error::{MicrobiomeError, Result};
use crate::filter::FilterResult;
use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker for undefined values.
pub const NA: &str = "NA";

pub const ALPHA_FILE: &str = "alpha_diversity.tsv";
pub const DIFFERENTIAL_FILE: &str = "differential_abundance.tsv";
pub const CURATION_FILE: &str = "curation.tsv";
pub const SUMMARY_FILE: &str = "summary.json";

/// File name of the distance matrix for one beta metric.
pub fn beta_file_name(matrix: &DistanceMatrix) -> String {
    format!("beta_{}.tsv", matrix.metric.name().replace('-', "_"))
}

fn tsv_writer(path: &Path) -> Result<Writer<File>> {
    Ok(WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

// === Tables ===

/// Write per-sample alpha diversity with the group of every sample.
///
/// Every sample of the table must exist in the dataset.
pub fn write_alpha_table(path: &Path, table: &AlphaTable, dataset: &Dataset) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    let mut header = vec!["sample_id".to_string(), "group".to_string()];
    header.extend(table.results.iter().map(|r| r.metric.name().to_string()));
    writer.write_record(&header)?;

    for (col, sample_id) in table.sample_ids.iter().enumerate() {
        let sample = dataset.sample(sample_id).ok_or_else(|| {
            MicrobiomeError::missing_sample(sample_id, "alpha diversity", "dataset")
        })?;
        let group = sample.label().unwrap_or(GroupLabel::Unknown);
        let mut record = vec![sample_id.clone(), group.name().to_string()];
        record.extend(table.results.iter().map(|r| optional(r.values[col])));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a square distance matrix with sample identifiers on both axes.
pub fn write_distance_matrix(path: &Path, matrix: &DistanceMatrix) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    let mut header = vec![String::new()];
    header.extend(matrix.sample_ids.iter().cloned());
    writer.write_record(&header)?;

    for (i, sample_id) in matrix.sample_ids.iter().enumerate() {
        let mut record = vec![sample_id.clone()];
        record.extend((0..matrix.len()).map(|j| matrix.distances[(i, j)].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per tested taxon.
pub fn write_differential(path: &Path, results: &DaResultSet) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record([
        "taxon_id",
        "lineage",
        "contrast",
        "method",
        "effect",
        "mean_coffee",
        "mean_no_coffee",
        "statistic",
        "prevalence",
        "p_value",
        "q_value",
        "failure",
    ])?;
    for r in results.iter() {
        writer.write_record([
            r.taxon_id.clone(),
            r.lineage.clone(),
            r.contrast.clone(),
            r.method.clone(),
            r.effect.to_string(),
            r.mean_coffee.to_string(),
            r.mean_no_coffee.to_string(),
            optional(r.statistic),
            r.prevalence.to_string(),
            optional(r.p_value),
            optional(r.q_value),
            r.failure.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the group counts and every unrecognised value.
///
/// Rows are `kind`, `value`, `count`: one `group` row per label, one
/// `missing` row, then one `unrecognized` row per raw value.
pub fn write_curation(path: &Path, summary: &CurationSummary) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["kind", "value", "count"])?;
    for label in GroupLabel::ALL {
        let count = summary.count(label).to_string();
        writer.write_record(["group", label.name(), count.as_str()])?;
    }
    let missing = summary.missing.to_string();
    writer.write_record(["missing", "", missing.as_str()])?;
    for (value, count) in &summary.unrecognized {
        let count = count.to_string();
        writer.write_record(["unrecognized", value.as_str(), count.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

// === Summary ===

/// Machine-readable summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    pub n_samples: usize,
    pub n_taxa: usize,
    pub curation: CurationSummary,
    pub alpha_metrics: Vec<String>,
    pub beta_metrics: Vec<String>,
    pub transform: String,
    pub test: String,
    pub correction: String,
    pub seed: u64,
    pub group_sizes: Option<GroupSizes>,
    pub filter: Option<FilterResult>,
    pub results: Option<ResultSummary>,
    /// Why differential abundance was not run, when it was not.
    #[serde(default)]
    pub differential_skipped: Option<String>,
    /// Files written, relative to the output directory.
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizes {
    pub coffee: usize,
    pub no_coffee: usize,
}

/// Everything the report writer needs from a finished run.
#[derive(Debug, Clone, Copy)]
pub struct ReportContents<'a> {
    pub dataset: &'a Dataset,
    pub curation: &'a Curation,
    pub alpha: Option<&'a AlphaTable>,
    pub beta: &'a [DistanceMatrix],
    pub differential: Option<&'a DaResultSet>,
}

/// Write every table and the run summary into `directory`.
///
/// `summary.outputs` is filled in with the files written. Returns the full
/// paths of everything written.
pub fn write_report(
    directory: &Path,
    contents: ReportContents<'_>,
    mut summary: RunSummary,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;
    let mut written = Vec::new();

    if let Some(alpha) = contents.alpha {
        let path = directory.join(ALPHA_FILE);
        write_alpha_table(&path, alpha, contents.dataset)?;
        written.push(path);
    }
    for matrix in contents.beta {
        let path = directory.join(beta_file_name(matrix));
        write_distance_matrix(&path, matrix)?;
        written.push(path);
    }
    if let Some(results) = contents.differential {
        let path = directory.join(DIFFERENTIAL_FILE);
        write_differential(&path, results)?;
        written.push(path);
    }
    let path = directory.join(CURATION_FILE);
    write_curation(&path, &contents.curation.summary)?;
    written.push(path);

    let summary_path = directory.join(SUMMARY_FILE);
    summary.outputs = written
        .iter()
        .chain(std::iter::once(&summary_path))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    written.push(summary_path);

    info!(directory = %directory.display(), files = written.len(), "report written");
    Ok(written)
}
