//! Synthetic American-Gut-shaped inputs for trying the pipeline end to end.
//!
//! Generates the three input tables (feature table, taxonomy, metadata)
//! with a `coffee_consumption` field taking the values `none`,
//! `occasional` and `daily`. Counts are negative binomial draws with no
//! built-in coffee effect, so a correctly configured run should find
//! nothing after correction.

use crate::data::{
    AbundanceInput, AbundanceMatrix, InputConfig, MetadataInput, Orientation, TableFormat,
    TaxonomyFormat, TaxonomyInput,
};
use crate::error::{MicrobiomeError, Result};
use csv::WriterBuilder;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const FEATURE_TABLE_FILE: &str = "feature-table.tsv";
pub const TAXONOMY_FILE: &str = "taxonomy.tsv";
pub const METADATA_FILE: &str = "metadata.tsv";
pub const SIMULATION_FILE: &str = "simulation.yaml";

/// Identifier column of the feature and taxonomy tables.
pub const OTU_ID_COLUMN: &str = "#OTU ID";
/// Identifier column of the metadata table.
pub const SAMPLE_ID_COLUMN: &str = "#SampleID";
/// Lineage column of the taxonomy table.
pub const LINEAGE_COLUMN: &str = "Taxonomy";
/// Metadata field holding the coffee answer.
pub const COFFEE_FIELD: &str = "coffee_consumption";
/// Values drawn for [`COFFEE_FIELD`].
pub const COFFEE_LEVELS: [&str; 3] = ["none", "occasional", "daily"];

const GENDERS: [&str; 2] = ["male", "female"];
const COUNTRIES: [&str; 4] = ["USA", "Canada", "UK", "Australia"];
const DIETS: [&str; 3] = ["Omnivore", "Vegetarian", "Vegan"];
const YES_NO: [&str; 2] = ["Yes", "No"];

const PHYLA: [&str; 4] = ["Firmicutes", "Bacteroidetes", "Proteobacteria", "Actinobacteria"];
const CLASSES: [&str; 4] = ["Clostridia", "Bacteroidia", "Gammaproteobacteria", "Actinobacteria"];
const ORDERS: [&str; 4] = [
    "Clostridiales",
    "Bacteroidales",
    "Enterobacteriales",
    "Bifidobacteriales",
];
const FAMILIES: [&str; 4] = [
    "Lachnospiraceae",
    "Bacteroidaceae",
    "Enterobacteriaceae",
    "Bifidobacteriaceae",
];
const GENERA: [&str; 4] = ["Roseburia", "Bacteroides", "Escherichia", "Bifidobacterium"];
const SPECIES: [&str; 4] = ["faecalis", "thetaiotaomicron", "coli", "longum"];

/// Configuration for synthetic data generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of samples (metadata rows and feature-table columns).
    pub n_samples: usize,
    /// Number of OTUs.
    pub n_otus: usize,
    /// Negative binomial number of successes.
    pub nb_successes: f64,
    /// Negative binomial success probability, in (0, 1).
    pub nb_probability: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            n_otus: 500,
            nb_successes: 5.0,
            nb_probability: 0.5,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Set dimensions.
    pub fn with_dimensions(mut self, n_samples: usize, n_otus: usize) -> Self {
        self.n_samples = n_samples;
        self.n_otus = n_otus;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Mean count of one OTU in one sample.
    pub fn expected_count(&self) -> f64 {
        self.nb_successes * (1.0 - self.nb_probability) / self.nb_probability
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_samples == 0 || self.n_otus == 0 {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "simulation needs at least one sample and one OTU, got {} x {}",
                self.n_samples, self.n_otus
            )));
        }
        if !(self.nb_successes > 0.0 && self.nb_successes.is_finite()) {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "nb_successes must be positive, got {}",
                self.nb_successes
            )));
        }
        if !(self.nb_probability > 0.0 && self.nb_probability < 1.0) {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "nb_probability must be in (0, 1), got {}",
                self.nb_probability
            )));
        }
        Ok(())
    }
}

/// One metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSample {
    #[serde(rename = "#SampleID")]
    pub sample_id: String,
    pub age: u32,
    pub gender: String,
    pub country: String,
    pub sample_type: String,
    pub diet_type: String,
    pub coffee_consumption: String,
    pub antibiotics_past_year: String,
    pub bmi: i64,
}

/// One taxonomy row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticTaxon {
    #[serde(rename = "#OTU ID")]
    pub otu_id: String,
    #[serde(rename = "Taxonomy")]
    pub lineage: String,
}

/// Result of synthetic data generation.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    /// OTUs x samples counts.
    pub abundance: AbundanceMatrix,
    pub taxonomy: Vec<SyntheticTaxon>,
    pub samples: Vec<SyntheticSample>,
    /// Configuration used.
    pub config: SimulationConfig,
}

impl SyntheticData {
    /// Write all tables plus the simulation config to a directory.
    ///
    /// Returns the input configuration that reads the written tables back.
    pub fn write_to_dir(&self, dir: &Path) -> Result<InputConfig> {
        std::fs::create_dir_all(dir)?;

        self.abundance.to_tsv(dir.join(FEATURE_TABLE_FILE), OTU_ID_COLUMN)?;
        write_rows(&dir.join(TAXONOMY_FILE), &self.taxonomy)?;
        write_rows(&dir.join(METADATA_FILE), &self.samples)?;
        std::fs::write(dir.join(SIMULATION_FILE), serde_yaml::to_string(&self.config)?)?;

        info!(directory = %dir.display(), "synthetic tables written");
        Ok(input_config(dir))
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Input configuration for tables written by [`SyntheticData::write_to_dir`].
pub fn input_config(dir: &Path) -> InputConfig {
    InputConfig {
        abundance: AbundanceInput {
            path: dir.join(FEATURE_TABLE_FILE),
            format: TableFormat::tsv(OTU_ID_COLUMN),
            orientation: Orientation::FeaturesAsRows,
        },
        taxonomy: Some(TaxonomyInput {
            path: dir.join(TAXONOMY_FILE),
            format: TaxonomyFormat::new(TableFormat::tsv(OTU_ID_COLUMN), LINEAGE_COLUMN),
        }),
        metadata: MetadataInput {
            path: dir.join(METADATA_FILE),
            format: TableFormat::tsv(SAMPLE_ID_COLUMN),
        },
    }
}

fn pick<R: Rng>(rng: &mut R, values: &[&str]) -> String {
    values[rng.gen_range(0..values.len())].to_string()
}

fn distribution_error(what: &str, e: impl std::fmt::Display) -> MicrobiomeError {
    MicrobiomeError::InvalidParameter(format!("{}: {}", what, e))
}

/// Generate synthetic tables.
pub fn generate_synthetic(config: &SimulationConfig) -> Result<SyntheticData> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let sample_ids: Vec<String> = (0..config.n_samples)
        .map(|i| format!("Sample_{:05}", i))
        .collect();
    let otu_ids: Vec<String> = (0..config.n_otus).map(|i| format!("OTU_{:04}", i)).collect();

    // Metadata
    let bmi = Normal::new(25.0, 5.0).map_err(|e| distribution_error("bmi distribution", e))?;
    let samples: Vec<SyntheticSample> = sample_ids
        .iter()
        .map(|id| SyntheticSample {
            sample_id: id.clone(),
            age: rng.gen_range(18..80),
            gender: pick(&mut rng, &GENDERS),
            country: pick(&mut rng, &COUNTRIES),
            sample_type: "Stool".to_string(),
            diet_type: pick(&mut rng, &DIETS),
            coffee_consumption: pick(&mut rng, &COFFEE_LEVELS),
            antibiotics_past_year: pick(&mut rng, &YES_NO),
            bmi: bmi.sample(&mut rng) as i64,
        })
        .collect();

    // Counts: negative binomial as a gamma-Poisson mixture
    let scale = (1.0 - config.nb_probability) / config.nb_probability;
    let rate = Gamma::new(config.nb_successes, scale)
        .map_err(|e| distribution_error("count distribution", e))?;
    let mut rows = Vec::with_capacity(config.n_otus);
    for _ in 0..config.n_otus {
        let mut row = Vec::with_capacity(config.n_samples);
        for _ in 0..config.n_samples {
            let lambda: f64 = rate.sample(&mut rng);
            let count = if lambda > 0.0 {
                Poisson::new(lambda)
                    .map_err(|e| distribution_error("count distribution", e))?
                    .sample(&mut rng)
            } else {
                0.0
            };
            row.push(count);
        }
        rows.push(row);
    }
    let abundance = AbundanceMatrix::from_rows(&rows, otu_ids.clone(), sample_ids)?;

    // Taxonomy: ranks drawn independently, always resolved to species
    let taxonomy: Vec<SyntheticTaxon> = otu_ids
        .into_iter()
        .map(|otu_id| {
            let lineage = format!(
                "k__Bacteria;p__{};c__{};o__{};f__{};g__{};s__{}",
                pick(&mut rng, &PHYLA),
                pick(&mut rng, &CLASSES),
                pick(&mut rng, &ORDERS),
                pick(&mut rng, &FAMILIES),
                pick(&mut rng, &GENERA),
                pick(&mut rng, &SPECIES),
            );
            SyntheticTaxon { otu_id, lineage }
        })
        .collect();

    info!(
        samples = config.n_samples,
        otus = config.n_otus,
        seed = config.seed,
        nnz = abundance.nnz(),
        "generated synthetic dataset"
    );

    Ok(SyntheticData {
        abundance,
        taxonomy,
        samples,
        config: config.clone(),
    })
}
