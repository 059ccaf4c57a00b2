//! Abundance matrix with sparse storage for microbiome feature tables.

use crate::data::table::{RawTable, TableFormat};
use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const TABLE: &str = "abundance";

/// Which axis of the abundance table holds the features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// One row per feature, one column per sample (QIIME / biom TSV layout).
    #[default]
    FeaturesAsRows,
    /// One row per sample, one column per feature (spreadsheet export layout).
    SamplesAsRows,
}

/// A sparse abundance matrix storing feature abundances across samples.
///
/// Rows represent features (taxa/ASVs), columns represent samples.
/// Values are non-negative counts or relative proportions.
/// Uses CSR (Compressed Sparse Row) format for efficient row-wise operations.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    /// Sparse matrix in CSR format (features × samples)
    data: CsMat<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl AbundanceMatrix {
    /// Create a new AbundanceMatrix from a sparse matrix and identifiers.
    pub fn new(
        data: CsMat<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(MicrobiomeError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(MicrobiomeError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        if let Some(&bad) = data.data().iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "Abundances must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build a matrix from dense rows (one `Vec` per feature).
    pub fn from_rows(
        rows: &[Vec<f64>],
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let n_samples = sample_ids.len();
        let mut tri_mat = TriMat::new((rows.len(), n_samples));
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_samples {
                return Err(MicrobiomeError::DimensionMismatch {
                    expected: n_samples,
                    actual: values.len(),
                });
            }
            for (col, &val) in values.iter().enumerate() {
                if val != 0.0 {
                    tri_mat.add_triplet(row, col, val);
                }
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load an abundance table from a delimited file.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        format: &TableFormat,
        orientation: Orientation,
    ) -> Result<Self> {
        let table = format.read(path, TABLE)?;
        Self::from_raw(&table, orientation)
    }

    /// Parse an abundance table held in memory.
    pub fn from_table_str(
        content: &str,
        format: &TableFormat,
        orientation: Orientation,
    ) -> Result<Self> {
        let table = format.parse(content, TABLE)?;
        Self::from_raw(&table, orientation)
    }

    fn from_raw(table: &RawTable, orientation: Orientation) -> Result<Self> {
        let value_cols = table.value_columns();
        if value_cols.is_empty() {
            return Err(MicrobiomeError::schema(
                TABLE,
                "table has no value columns besides the identifier column",
            ));
        }
        let column_ids: Vec<String> = value_cols
            .iter()
            .map(|&c| table.headers[c].clone())
            .collect();
        let row_ids: Vec<String> = table.rows.iter().map(|r| r.id(table).to_string()).collect();

        let mut duplicate_check = std::collections::HashSet::new();
        for id in &column_ids {
            if !duplicate_check.insert(id) {
                return Err(MicrobiomeError::schema(
                    TABLE,
                    format!("duplicate column identifier '{}'", id),
                ));
            }
        }

        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, &col) in value_cols.iter().enumerate() {
                let raw = row.field(col);
                let value = parse_abundance(raw).map_err(|reason| MicrobiomeError::Parse {
                    table: TABLE.to_string(),
                    line: row.line,
                    column: table.headers[col].clone(),
                    value: raw.to_string(),
                    reason: reason.to_string(),
                })?;
                if value > 0.0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
        }

        let (feature_ids, sample_ids) = match orientation {
            Orientation::FeaturesAsRows => (row_ids, column_ids),
            Orientation::SamplesAsRows => (column_ids, row_ids),
        };

        let mut tri_mat = TriMat::new((feature_ids.len(), sample_ids.len()));
        for (r, c, val) in triplets {
            match orientation {
                Orientation::FeaturesAsRows => tri_mat.add_triplet(r, c, val),
                Orientation::SamplesAsRows => tri_mat.add_triplet(c, r, val),
            }
        }

        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Write the matrix as a features-as-rows TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, id_header: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "{}", id_header)?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for col_idx in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row_idx, col_idx))?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Total number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<f64> {
        &self.data
    }

    /// Index of a sample by identifier.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == sample_id)
    }

    /// Index of a feature by identifier.
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.feature_ids.iter().position(|f| f == feature_id)
    }

    /// Get a dense vector for a specific row (feature).
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Get a dense vector for a specific column (sample).
    pub fn col_dense(&self, col: usize) -> Vec<f64> {
        (0..self.n_features()).map(|row| self.get(row, col)).collect()
    }

    /// Number of samples in which each feature is non-zero.
    pub fn row_nnz(&self) -> Vec<usize> {
        (0..self.n_features())
            .map(|row| self.data.outer_view(row).map(|v| v.nnz()).unwrap_or(0))
            .collect()
    }

    /// Compute column sums (library sizes per sample).
    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_samples()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// True when every stored value is a whole number (raw counts).
    pub fn is_integral(&self) -> bool {
        self.data.data().iter().all(|v| v.fract() == 0.0)
    }

    /// Subset the matrix to include only specified features (by index).
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        let n_samples = self.n_samples();
        let mut tri_mat = TriMat::new((indices.len(), n_samples));
        let mut new_feature_ids = Vec::with_capacity(indices.len());

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_features() {
                return Err(MicrobiomeError::InvalidParameter(format!(
                    "Feature index {} out of bounds",
                    old_row
                )));
            }
            new_feature_ids.push(self.feature_ids[old_row].clone());

            if let Some(row_vec) = self.data.outer_view(old_row) {
                for (col, &val) in row_vec.iter() {
                    tri_mat.add_triplet(new_row, col, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), new_feature_ids, self.sample_ids.clone())
    }

    /// Subset the matrix to include only specified samples (by index).
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let n_features = self.n_features();
        let col_map: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| (old_idx, new_idx))
            .collect();

        let mut new_sample_ids = Vec::with_capacity(indices.len());
        for &old_col in indices {
            if old_col >= self.n_samples() {
                return Err(MicrobiomeError::InvalidParameter(format!(
                    "Sample index {} out of bounds",
                    old_col
                )));
            }
            new_sample_ids.push(self.sample_ids[old_col].clone());
        }

        let mut tri_mat = TriMat::new((n_features, indices.len()));
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (old_col, &val) in row_vec.iter() {
                if let Some(&new_col) = col_map.get(&old_col) {
                    tri_mat.add_triplet(row, new_col, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), self.feature_ids.clone(), new_sample_ids)
    }

    /// Convert to a dense matrix (features × samples).
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_features(), self.n_samples());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val;
            }
        }
        dense
    }
}

fn parse_abundance(raw: &str) -> std::result::Result<f64, &'static str> {
    if raw.is_empty() {
        return Err("empty abundance value");
    }
    let value: f64 = raw.parse().map_err(|_| "not a number")?;
    if !value.is_finite() {
        return Err("abundance must be finite");
    }
    if value < 0.0 {
        return Err("abundance must be non-negative");
    }
    Ok(value)
}
