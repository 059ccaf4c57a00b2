//! Sample metadata handling.

use crate::data::table::{RawTable, TableFormat};
use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const TABLE: &str = "metadata";

/// Tokens treated as a missing value (compared case-insensitively).
const MISSING_TOKENS: [&str; 6] = ["", "na", "nan", "null", "not provided", "not applicable"];

/// A metadata value that can be categorical or continuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable, with the text it was parsed from.
    Continuous { value: f64, raw: String },
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The value exactly as written in the table, `None` when missing.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            Variable::Continuous { raw, .. } => Some(raw),
            Variable::Missing => None,
        }
    }

    /// Render the value as it would appear in a table (`NA` when missing).
    pub fn render(&self) -> String {
        self.raw().unwrap_or("NA").to_string()
    }
}

/// Type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

fn is_missing_token(raw: &str) -> bool {
    let lower = raw.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&lower.as_str())
}

/// Sample metadata containing variables for each sample.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Sample IDs in order.
    sample_ids: Vec<String>,
    /// Column names (identifier column excluded).
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
    /// Inferred type of each column.
    column_types: HashMap<String, VariableType>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load metadata from a delimited file.
    ///
    /// Columns are inferred as continuous if every non-missing value parses
    /// as a number, otherwise categorical.
    pub fn from_file<P: AsRef<Path>>(path: P, format: &TableFormat) -> Result<Self> {
        let table = format.read(path, TABLE)?;
        Ok(Self::from_raw(&table))
    }

    /// Parse a metadata table held in memory.
    pub fn from_table_str(content: &str, format: &TableFormat) -> Result<Self> {
        let table = format.parse(content, TABLE)?;
        Ok(Self::from_raw(&table))
    }

    fn from_raw(table: &RawTable) -> Self {
        let value_cols = table.value_columns();
        let column_names: Vec<String> = value_cols
            .iter()
            .map(|&c| table.headers[c].trim().to_string())
            .collect();

        // Infer column types
        let mut column_types = HashMap::new();
        for (&col, name) in value_cols.iter().zip(&column_names) {
            let all_numeric = table.rows.iter().all(|row| {
                let v = row.field(col);
                is_missing_token(v) || v.parse::<f64>().is_ok()
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            column_types.insert(name.clone(), var_type);
        }

        let mut sample_ids = Vec::with_capacity(table.rows.len());
        let mut data = HashMap::with_capacity(table.rows.len());
        for row in &table.rows {
            let sample_id = row.id(table).to_string();
            let mut sample_data = HashMap::with_capacity(value_cols.len());
            for (&col, name) in value_cols.iter().zip(&column_names) {
                let raw = row.field(col);
                let var = if is_missing_token(raw) {
                    Variable::Missing
                } else {
                    match column_types.get(name) {
                        Some(VariableType::Continuous) => match raw.parse::<f64>() {
                            Ok(value) => Variable::Continuous {
                                value,
                                raw: raw.to_string(),
                            },
                            Err(_) => Variable::Missing,
                        },
                        _ => Variable::Categorical(raw.to_string()),
                    }
                };
                sample_data.insert(name.clone(), var);
            }
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, sample_data);
        }

        Self {
            sample_ids,
            column_names,
            data,
            column_types,
        }
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns (variables).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Get all values for a column, in sample order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        if !self.has_column(column) {
            return Err(MicrobiomeError::schema(
                TABLE,
                format!("required field '{}' not found", column),
            ));
        }
        Ok(self
            .sample_ids
            .iter()
            .map(|sid| {
                self.data
                    .get(sid)
                    .and_then(|m| m.get(column))
                    .unwrap_or(&Variable::Missing)
            })
            .collect())
    }

    /// Get the type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Distinct rendered values of a column, sorted.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let values = self.column(column)?;
        let levels: BTreeSet<String> = values
            .iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.render())
            .collect();
        Ok(levels.into_iter().collect())
    }

    /// Subset metadata to the specified samples, in the given order.
    pub fn subset_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let mut new_data = HashMap::with_capacity(sample_ids.len());
        for sid in sample_ids {
            let sample_data = self
                .data
                .get(sid)
                .ok_or_else(|| MicrobiomeError::missing_sample(sid, "requested", TABLE))?;
            new_data.insert(sid.clone(), sample_data.clone());
        }

        Ok(Self {
            sample_ids: sample_ids.to_vec(),
            column_names: self.column_names.clone(),
            data: new_data,
            column_types: self.column_types.clone(),
        })
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data.contains_key(sample_id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}
