//! Joined dataset: abundance matrix, taxa and metadata keyed by sample.

use crate::data::abundance::{AbundanceMatrix, Orientation};
use crate::data::group::GroupLabel;
use crate::data::metadata::{Metadata, Variable};
use crate::data::table::TableFormat;
use crate::data::taxonomy::{Taxon, Taxonomy, TaxonomyFormat};
use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How to reconcile sample sets that differ between tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// Any sample present in one table but not the other is an error.
    Strict,
    /// Keep only samples present in both tables, logging what was dropped.
    Intersection,
}

/// Loader behaviour beyond the table layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderOptions {
    pub join: JoinPolicy,
    /// Drop features whose abundance is zero in every kept sample.
    #[serde(default)]
    pub drop_empty_features: bool,
    /// Drop samples whose total abundance is zero.
    #[serde(default)]
    pub drop_empty_samples: bool,
}

impl LoaderOptions {
    /// Options with the given join policy and nothing dropped.
    pub fn new(join: JoinPolicy) -> Self {
        Self {
            join,
            drop_empty_features: false,
            drop_empty_samples: false,
        }
    }
}

/// Abundance table location and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbundanceInput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub format: TableFormat,
    #[serde(default)]
    pub orientation: Orientation,
}

/// Taxonomy table location and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyInput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub format: TaxonomyFormat,
}

/// Metadata table location and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataInput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub format: TableFormat,
}

/// The three input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub abundance: AbundanceInput,
    /// Optional; without it every taxon is unresolved.
    #[serde(default)]
    pub taxonomy: Option<TaxonomyInput>,
    pub metadata: MetadataInput,
}

impl InputConfig {
    /// Make relative paths relative to `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.abundance.path);
        fix(&mut self.metadata.path);
        if let Some(tax) = self.taxonomy.as_mut() {
            fix(&mut tax.path);
        }
    }
}

/// Abundances, taxa and metadata for a consistent set of samples.
///
/// Built once by the loader and immutable afterwards; group labels are
/// attached exactly once with [`Dataset::attach_labels`].
#[derive(Debug, Clone)]
pub struct Dataset {
    abundance: AbundanceMatrix,
    /// One taxon per feature, in matrix row order.
    taxa: Vec<Taxon>,
    /// Aligned to the matrix sample order.
    metadata: Metadata,
    labels: Option<Vec<GroupLabel>>,
}

impl Dataset {
    /// Read all input tables and join them.
    pub fn load(inputs: &InputConfig, options: &LoaderOptions) -> Result<Self> {
        info!(path = %inputs.abundance.path.display(), "loading abundance table");
        let abundance = AbundanceMatrix::from_file(
            &inputs.abundance.path,
            &inputs.abundance.format,
            inputs.abundance.orientation,
        )?;
        let taxonomy = match &inputs.taxonomy {
            Some(tax) => {
                info!(path = %tax.path.display(), "loading taxonomy table");
                Taxonomy::from_file(&tax.path, &tax.format)?
            }
            None => {
                warn!("no taxonomy table configured, all taxa are unresolved");
                Taxonomy::new()
            }
        };
        info!(path = %inputs.metadata.path.display(), "loading metadata table");
        let metadata = Metadata::from_file(&inputs.metadata.path, &inputs.metadata.format)?;

        Self::join(abundance, &taxonomy, &metadata, options)
    }

    /// Join already-parsed tables under the configured policy.
    pub fn join(
        abundance: AbundanceMatrix,
        taxonomy: &Taxonomy,
        metadata: &Metadata,
        options: &LoaderOptions,
    ) -> Result<Self> {
        let in_abundance: HashSet<&str> =
            abundance.sample_ids().iter().map(String::as_str).collect();

        let keep: Vec<usize> = match options.join {
            JoinPolicy::Strict => {
                if let Some(sid) = abundance.sample_ids().iter().find(|s| !metadata.has_sample(s)) {
                    return Err(MicrobiomeError::missing_sample(sid, "abundance", "metadata"));
                }
                if let Some(sid) = metadata
                    .sample_ids()
                    .iter()
                    .find(|s| !in_abundance.contains(s.as_str()))
                {
                    return Err(MicrobiomeError::missing_sample(sid, "metadata", "abundance"));
                }
                (0..abundance.n_samples()).collect()
            }
            JoinPolicy::Intersection => {
                let keep: Vec<usize> = (0..abundance.n_samples())
                    .filter(|&i| metadata.has_sample(&abundance.sample_ids()[i]))
                    .collect();
                let dropped_abundance = abundance.n_samples() - keep.len();
                let dropped_metadata = metadata
                    .sample_ids()
                    .iter()
                    .filter(|s| !in_abundance.contains(s.as_str()))
                    .count();
                if dropped_abundance > 0 || dropped_metadata > 0 {
                    warn!(
                        dropped_abundance,
                        dropped_metadata,
                        kept = keep.len(),
                        "intersection join dropped samples"
                    );
                }
                keep
            }
        };

        if keep.is_empty() {
            return Err(MicrobiomeError::InsufficientData(
                "no samples are shared by the abundance and metadata tables".to_string(),
            ));
        }

        let mut abundance = if keep.len() == abundance.n_samples() {
            abundance
        } else {
            abundance.subset_samples(&keep)?
        };

        if options.drop_empty_samples {
            let sums = abundance.col_sums();
            let non_empty: Vec<usize> = (0..sums.len()).filter(|&i| sums[i] > 0.0).collect();
            if non_empty.len() < sums.len() {
                info!(dropped = sums.len() - non_empty.len(), "dropping zero-total samples");
                if non_empty.is_empty() {
                    return Err(MicrobiomeError::InsufficientData(
                        "every sample has zero total abundance".to_string(),
                    ));
                }
                abundance = abundance.subset_samples(&non_empty)?;
            }
        }

        if options.drop_empty_features {
            let nnz = abundance.row_nnz();
            let present: Vec<usize> = (0..nnz.len()).filter(|&i| nnz[i] > 0).collect();
            if present.len() < nnz.len() {
                info!(dropped = nnz.len() - present.len(), "dropping all-zero features");
                if present.is_empty() {
                    return Err(MicrobiomeError::InsufficientData(
                        "every feature is zero in every sample".to_string(),
                    ));
                }
                abundance = abundance.subset_features(&present)?;
            }
        }

        let taxa = taxonomy.resolve(abundance.feature_ids());
        let unresolved = taxa.iter().filter(|t| t.is_unresolved()).count();
        if unresolved > 0 {
            info!(unresolved, total = taxa.len(), "taxa without a resolved lineage");
        }
        let matched = abundance
            .feature_ids()
            .iter()
            .filter(|id| taxonomy.get(id).is_some())
            .count();
        let unused = taxonomy.len() - matched;
        if unused > 0 {
            debug!(unused, "taxonomy entries with no matching feature");
        }

        let metadata = metadata.subset_samples(abundance.sample_ids())?;

        info!(
            samples = abundance.n_samples(),
            features = abundance.n_features(),
            "dataset joined"
        );

        Ok(Self {
            abundance,
            taxa,
            metadata,
            labels: None,
        })
    }

    /// Attach curated group labels, one per sample in dataset order.
    pub fn attach_labels(mut self, labels: Vec<GroupLabel>) -> Result<Self> {
        if self.labels.is_some() {
            return Err(MicrobiomeError::Pipeline(
                "group labels are already attached to this dataset".to_string(),
            ));
        }
        if labels.len() != self.n_samples() {
            return Err(MicrobiomeError::DimensionMismatch {
                expected: self.n_samples(),
                actual: labels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// The abundance matrix (features × samples).
    pub fn abundance(&self) -> &AbundanceMatrix {
        &self.abundance
    }

    /// Taxa in feature order.
    pub fn taxa(&self) -> &[Taxon] {
        &self.taxa
    }

    /// Metadata aligned to the dataset samples.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        self.abundance.sample_ids()
    }

    /// Feature identifiers.
    pub fn feature_ids(&self) -> &[String] {
        self.abundance.feature_ids()
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.abundance.n_samples()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.abundance.n_features()
    }

    /// Attached labels, if curation has run.
    pub fn labels(&self) -> Option<&[GroupLabel]> {
        self.labels.as_deref()
    }

    /// View of one sample by identifier.
    pub fn sample(&self, sample_id: &str) -> Option<Sample<'_>> {
        self.abundance
            .sample_index(sample_id)
            .map(|index| Sample { dataset: self, index })
    }

    /// Views of all samples in order.
    pub fn samples(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        (0..self.n_samples()).map(move |index| Sample { dataset: self, index })
    }

    /// Sample indices of the coffee and no-coffee groups.
    ///
    /// Fails when labels are not attached or either group is empty.
    pub fn group_indices(&self) -> Result<(Vec<usize>, Vec<usize>)> {
        let labels = self.labels.as_ref().ok_or_else(|| {
            MicrobiomeError::Pipeline(
                "group labels must be attached before comparing groups".to_string(),
            )
        })?;
        let coffee: Vec<usize> = (0..labels.len())
            .filter(|&i| labels[i] == GroupLabel::Coffee)
            .collect();
        let no_coffee: Vec<usize> = (0..labels.len())
            .filter(|&i| labels[i] == GroupLabel::NoCoffee)
            .collect();
        if coffee.is_empty() || no_coffee.is_empty() {
            return Err(MicrobiomeError::InsufficientData(format!(
                "two-group comparison needs samples in both groups (coffee: {}, no-coffee: {})",
                coffee.len(),
                no_coffee.len()
            )));
        }
        Ok((coffee, no_coffee))
    }
}

/// Borrowed view of one sample of a [`Dataset`].
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> Sample<'a> {
    /// Sample identifier.
    pub fn id(&self) -> &'a str {
        &self.dataset.sample_ids()[self.index]
    }

    /// Column index in the abundance matrix.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Attached group label, if any.
    pub fn label(&self) -> Option<GroupLabel> {
        self.dataset.labels.as_ref().map(|l| l[self.index])
    }

    /// Abundance of one taxon in this sample.
    pub fn abundance(&self, taxon_id: &str) -> Option<f64> {
        self.dataset
            .abundance
            .feature_index(taxon_id)
            .map(|row| self.dataset.abundance.get(row, self.index))
    }

    /// Total abundance of this sample.
    pub fn total(&self) -> f64 {
        self.dataset.abundance.col_dense(self.index).iter().sum()
    }

    /// Raw metadata value of a field.
    pub fn metadata(&self, field: &str) -> Option<&'a Variable> {
        self.dataset.metadata.get(self.id(), field)
    }
}
