//! Delimited table format description and the shared raw-table reader.

use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_delimiter() -> char {
    '\t'
}

/// Layout of one delimited input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFormat {
    /// Column delimiter (single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Name of the identifier column (sample or feature id).
    pub id_column: String,
    /// Leading lines to skip before the header (e.g. biom export banners).
    #[serde(default)]
    pub skip_lines: usize,
}

impl TableFormat {
    /// Tab-delimited table with the given identifier column.
    pub fn tsv(id_column: &str) -> Self {
        Self {
            delimiter: '\t',
            id_column: id_column.to_string(),
            skip_lines: 0,
        }
    }

    /// Comma-delimited table with the given identifier column.
    pub fn csv(id_column: &str) -> Self {
        Self {
            delimiter: ',',
            id_column: id_column.to_string(),
            skip_lines: 0,
        }
    }

    /// Skip `n` leading lines before the header.
    pub fn with_skip_lines(mut self, n: usize) -> Self {
        self.skip_lines = n;
        self
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(MicrobiomeError::InvalidParameter(format!(
                "Delimiter '{}' is not a single ASCII character",
                self.delimiter
            )))
        }
    }

    /// Read a whole table from disk.
    pub(crate) fn read<P: AsRef<Path>>(&self, path: P, table: &str) -> Result<RawTable> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content, table)
    }

    /// Parse a whole table from an in-memory string.
    pub(crate) fn parse(&self, content: &str, table: &str) -> Result<RawTable> {
        let body: String = content
            .lines()
            .skip(self.skip_lines)
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(MicrobiomeError::schema(table, "table has no header row"));
        }
        let id_index = header_position(&headers, &self.id_column).ok_or_else(|| {
            MicrobiomeError::schema(
                table,
                format!(
                    "required identifier column '{}' not found (columns: {})",
                    self.id_column,
                    headers.join(", ")
                ),
            )
        })?;

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for record in reader.records() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line() as usize + self.skip_lines)
                .unwrap_or(0);
            let fields: Vec<String> = record.iter().map(String::from).collect();
            let id = fields.get(id_index).cloned().unwrap_or_default();
            if id.trim().is_empty() {
                return Err(MicrobiomeError::schema(
                    table,
                    format!("empty identifier in column '{}' at line {}", self.id_column, line),
                ));
            }
            if !seen.insert(id.clone()) {
                return Err(MicrobiomeError::schema(
                    table,
                    format!("duplicate identifier '{}' at line {}", id, line),
                ));
            }
            rows.push(RawRow { line, fields });
        }

        if rows.is_empty() {
            return Err(MicrobiomeError::schema(table, "table has no data rows"));
        }

        Ok(RawTable {
            headers,
            id_index,
            rows,
        })
    }
}

fn header_position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name.trim())
}

/// A parsed table before any typing.
///
/// Identifiers (the id column and header names) are kept byte-for-byte;
/// value fields are trimmed on access.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub headers: Vec<String>,
    pub id_index: usize,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn id(&self, table: &RawTable) -> &str {
        &self.fields[table.id_index]
    }

    /// Trimmed field at `col`, empty if the row is short.
    pub fn field(&self, col: usize) -> &str {
        self.fields.get(col).map(|f| f.trim()).unwrap_or("")
    }
}

impl RawTable {
    /// Column indices other than the identifier column.
    pub fn value_columns(&self) -> Vec<usize> {
        (0..self.headers.len()).filter(|&c| c != self.id_index).collect()
    }

    /// Index of the named column, ignoring surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        header_position(&self.headers, name)
    }
}
