//! Error types for the coffee-microbiome library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum MicrobiomeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent or the table shape is unusable.
    #[error("Schema error in {table} table: {reason}")]
    Schema { table: String, reason: String },

    /// A field could not be parsed into the expected value.
    #[error("Parse error in {table} table at line {line}, column '{column}': invalid value '{value}' ({reason})")]
    Parse {
        table: String,
        line: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// A sample identifier is present in one table but absent from another.
    #[error("Sample '{sample_id}' is present in the {present_in} table but missing from the {missing_from} table")]
    MissingSample {
        sample_id: String,
        present_in: String,
        missing_from: String,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MicrobiomeError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_sample(sample_id: &str, present_in: &str, missing_from: &str) -> Self {
        Self::MissingSample {
            sample_id: sample_id.to_string(),
            present_in: present_in.to_string(),
            missing_from: missing_from.to_string(),
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MicrobiomeError>;
