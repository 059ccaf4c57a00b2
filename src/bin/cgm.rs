//! CGM - Coffee vs Gut Microbiome CLI
//!
//! Command-line interface for the coffee-consumption microbiome analysis.

use clap::{Parser, Subcommand, ValueEnum};
use coffee_microbiome::curate::{curate, discover_coffee_fields};
use coffee_microbiome::data::{AbundanceMatrix, Dataset, Metadata, Orientation, TableFormat};
use coffee_microbiome::diversity::compute_diversity;
use coffee_microbiome::error::Result;
use coffee_microbiome::pipeline::{AnalysisConfig, Pipeline, EXAMPLE_CONFIG};
use coffee_microbiome::profile::profile_matrix;
use coffee_microbiome::report::{
    beta_file_name, write_alpha_table, write_curation, write_distance_matrix, ALPHA_FILE,
    CURATION_FILE,
};
use coffee_microbiome::simulate::{generate_synthetic, SimulationConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Output format for `profile` and `discover`
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileFormat {
    Text,
    Json,
    Yaml,
}

/// Table orientation accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOrientation {
    /// One row per taxon
    FeaturesAsRows,
    /// One row per sample
    SamplesAsRows,
}

impl From<CliOrientation> for Orientation {
    fn from(o: CliOrientation) -> Self {
        match o {
            CliOrientation::FeaturesAsRows => Orientation::FeaturesAsRows,
            CliOrientation::SamplesAsRows => Orientation::SamplesAsRows,
        }
    }
}

/// Coffee consumption vs gut microbiome analysis
#[derive(Parser)]
#[command(name = "cgm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis from a YAML configuration file
    Run {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Override the configured output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load the inputs and report how samples were labelled
    Curate {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Also write the curation table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute only the configured diversity metrics
    Diversity {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Directory for the diversity tables (default: configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Profile an abundance table
    Profile {
        /// Path to the abundance table
        #[arg(short, long)]
        abundance: PathBuf,

        /// Identifier column name
        #[arg(long, default_value = "#OTU ID")]
        id_column: String,

        /// Column delimiter
        #[arg(long, default_value = "\t")]
        delimiter: char,

        /// Leading lines to skip before the header
        #[arg(long, default_value = "0")]
        skip_lines: usize,

        /// Table orientation
        #[arg(long, value_enum, default_value = "features-as-rows")]
        orientation: CliOrientation,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ProfileFormat,
    },

    /// List metadata fields that look like coffee intake, with their values
    Discover {
        /// Path to the metadata table
        #[arg(short, long)]
        metadata: PathBuf,

        /// Sample identifier column name
        #[arg(long, default_value = "#SampleID")]
        id_column: String,

        /// Column delimiter
        #[arg(long, default_value = "\t")]
        delimiter: char,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ProfileFormat,
    },

    /// Generate a synthetic dataset to try the pipeline on
    Simulate {
        /// Output directory for the generated tables
        #[arg(short, long)]
        output: PathBuf,

        /// Number of samples
        #[arg(long, default_value = "1000")]
        samples: usize,

        /// Number of OTUs
        #[arg(long, default_value = "500")]
        otus: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Write a configuration template to edit
    Example {
        /// Output path for the template YAML
        #[arg(short, long, default_value = "analysis.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, output } => cmd_run(&config, output),
        Commands::Curate { config, output } => cmd_curate(&config, output.as_deref()),
        Commands::Diversity { config, output } => cmd_diversity(&config, output),
        Commands::Profile {
            abundance,
            id_column,
            delimiter,
            skip_lines,
            orientation,
            format,
        } => {
            let table = TableFormat {
                delimiter,
                id_column,
                skip_lines,
            };
            cmd_profile(&abundance, &table, orientation.into(), format)
        }
        Commands::Discover {
            metadata,
            id_column,
            delimiter,
            format,
        } => {
            let table = TableFormat {
                delimiter,
                id_column,
                skip_lines: 0,
            };
            cmd_discover(&metadata, &table, format)
        }
        Commands::Simulate {
            output,
            samples,
            otus,
            seed,
        } => {
            let config = SimulationConfig::default()
                .with_dimensions(samples, otus)
                .with_seed(seed);
            cmd_simulate(&output, &config)
        }
        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &Path, output: Option<PathBuf>) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::from_yaml_file(path)?;
    if let Some(dir) = output {
        config.output.directory = dir;
    }
    Ok(config)
}

/// Run the full analysis
fn cmd_run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let pipeline = Pipeline::new(load_config(config_path, output)?)?;
    let (report, written) = pipeline.run_and_write()?;

    println!("{}", report.curation.summary);
    match (report.results(), &report.differential_skipped) {
        (Some(results), _) => println!("{}", results.summary()),
        (None, Some(reason)) => println!("Differential abundance skipped: {}", reason),
        (None, None) => {}
    }
    println!("Wrote {} files to {}", written.len(), pipeline.config().output.directory.display());
    Ok(())
}

/// Curate labels only
fn cmd_curate(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, None)?;
    let dataset = Dataset::load(&config.inputs, &config.loader)?;
    let curation = curate(dataset.metadata(), &config.curation)?;

    println!("{}", curation.summary);
    if let Some(path) = output {
        write_curation(path, &curation.summary)?;
        eprintln!("Curation table written to {}", path.display());
    }
    Ok(())
}

/// Diversity only
fn cmd_diversity(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path, output)?;
    let dataset = Dataset::load(&config.inputs, &config.loader)?;
    let curation = curate(dataset.metadata(), &config.curation)?;
    let dataset = dataset.attach_labels(curation.labels)?;
    let results = compute_diversity(&dataset, &config.diversity)?;

    let dir = &config.output.directory;
    std::fs::create_dir_all(dir)?;
    if let Some(alpha) = &results.alpha {
        write_alpha_table(&dir.join(ALPHA_FILE), alpha, &dataset)?;
    }
    for matrix in &results.beta {
        write_distance_matrix(&dir.join(beta_file_name(matrix)), matrix)?;
    }
    write_curation(&dir.join(CURATION_FILE), &curation.summary)?;
    println!("Diversity tables written to {}", dir.display());
    Ok(())
}

/// Profile an abundance table
fn cmd_profile(
    path: &Path,
    table: &TableFormat,
    orientation: Orientation,
    format: ProfileFormat,
) -> Result<()> {
    let matrix = AbundanceMatrix::from_file(path, table, orientation)?;
    let profile = profile_matrix(&matrix);

    match format {
        ProfileFormat::Text => print!("{}", profile),
        ProfileFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        ProfileFormat::Yaml => print!("{}", serde_yaml::to_string(&profile)?),
    }
    Ok(())
}

/// List candidate coffee fields
fn cmd_discover(path: &Path, table: &TableFormat, format: ProfileFormat) -> Result<()> {
    let metadata = Metadata::from_file(path, table)?;
    let candidates = discover_coffee_fields(&metadata)?;

    match format {
        ProfileFormat::Json => println!("{}", serde_json::to_string_pretty(&candidates)?),
        ProfileFormat::Yaml => print!("{}", serde_yaml::to_string(&candidates)?),
        ProfileFormat::Text if candidates.is_empty() => {
            println!("No coffee-related fields found; inspect the metadata manually.");
        }
        ProfileFormat::Text => {
            for candidate in &candidates {
                print!("{}", candidate);
            }
        }
    }
    Ok(())
}

/// Generate synthetic input tables
fn cmd_simulate(output: &Path, config: &SimulationConfig) -> Result<()> {
    let data = generate_synthetic(config)?;
    data.write_to_dir(output)?;
    println!(
        "Wrote {} samples x {} OTUs to {}",
        config.n_samples,
        config.n_otus,
        output.display()
    );
    Ok(())
}

/// Write the configuration template
fn cmd_example(output_path: &Path) -> Result<()> {
    std::fs::write(output_path, EXAMPLE_CONFIG)?;
    eprintln!("Wrote configuration template to {}", output_path.display());
    eprintln!("Every value marked EDIT must be set for your study before running.");
    Ok(())
}
