//! Taxon lineages parsed from a taxonomy table.

use crate::data::table::{RawTable, TableFormat};
use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const TABLE: &str = "taxonomy";

/// Ranks of a lineage, from broadest to most specific.
pub const RANKS: [&str; 7] = ["kingdom", "phylum", "class", "order", "family", "genus", "species"];

fn default_lineage_column() -> String {
    "Taxonomy".to_string()
}

fn default_rank_separator() -> char {
    ';'
}

/// Layout of the taxonomy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyFormat {
    #[serde(flatten)]
    pub table: TableFormat,
    /// Column holding the lineage string.
    #[serde(default = "default_lineage_column")]
    pub lineage_column: String,
    /// Separator between ranks inside the lineage string.
    #[serde(default = "default_rank_separator")]
    pub rank_separator: char,
}

impl TaxonomyFormat {
    /// QIIME-style layout: `Feature ID<TAB>Taxon` with `;`-separated ranks.
    pub fn new(table: TableFormat, lineage_column: &str) -> Self {
        Self {
            table,
            lineage_column: lineage_column.to_string(),
            rank_separator: ';',
        }
    }
}

/// A feature with its (possibly partial) lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    /// Feature identifier (OTU/ASV id).
    pub id: String,
    /// One entry per rank in [`RANKS`]; `None` when unresolved.
    pub lineage: Vec<Option<String>>,
}

impl Taxon {
    /// A taxon with no resolved rank.
    pub fn unresolved(id: &str) -> Self {
        Self {
            id: id.to_string(),
            lineage: vec![None; RANKS.len()],
        }
    }

    /// Parse a lineage string such as `k__Bacteria;p__Firmicutes;c__`.
    ///
    /// Rank prefixes (`k__`) are stripped. Empty names and the usual
    /// placeholders mark a rank unresolved, and every rank after the first
    /// unresolved one is unresolved too.
    pub fn from_lineage(id: &str, lineage: &str, separator: char) -> Self {
        let mut ranks: Vec<Option<String>> = Vec::with_capacity(RANKS.len());
        let mut resolved = true;
        let mut parts = lineage.split(separator);
        for _ in 0..RANKS.len() {
            let name = parts.next().and_then(clean_rank_name);
            if name.is_none() {
                resolved = false;
            }
            ranks.push(if resolved { name } else { None });
        }
        Self {
            id: id.to_string(),
            lineage: ranks,
        }
    }

    /// Number of leading ranks that are resolved.
    pub fn depth(&self) -> usize {
        self.lineage.iter().take_while(|r| r.is_some()).count()
    }

    /// True when no rank is resolved.
    pub fn is_unresolved(&self) -> bool {
        self.depth() == 0
    }

    /// Name at a rank, if resolved.
    pub fn rank(&self, index: usize) -> Option<&str> {
        self.lineage.get(index).and_then(|r| r.as_deref())
    }

    /// Lineage formatted with rank prefixes, or `unresolved`.
    pub fn lineage_string(&self) -> String {
        if self.is_unresolved() {
            return "unresolved".to_string();
        }
        self.lineage
            .iter()
            .zip(RANKS.iter())
            .filter_map(|(name, rank)| {
                name.as_ref()
                    .map(|n| format!("{}__{}", &rank[..1], n))
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn clean_rank_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = match trimmed.find("__") {
        Some(pos) if pos <= 1 => &trimmed[pos + 2..],
        _ => trimmed,
    };
    let name = name.trim();
    let lower = name.to_ascii_lowercase();
    if name.is_empty()
        || lower == "unclassified"
        || lower == "unassigned"
        || lower == "unknown"
        || lower == "na"
    {
        None
    } else {
        Some(name.to_string())
    }
}

/// Lookup of taxa by feature identifier.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    taxa: HashMap<String, Taxon>,
}

impl Taxonomy {
    /// Empty taxonomy: every feature resolves to an unresolved taxon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-parsed taxa.
    pub fn from_taxa(taxa: impl IntoIterator<Item = Taxon>) -> Self {
        Self {
            taxa: taxa.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Load a taxonomy table from disk.
    pub fn from_file<P: AsRef<Path>>(path: P, format: &TaxonomyFormat) -> Result<Self> {
        let table = format.table.read(path, TABLE)?;
        Self::from_raw(&table, format)
    }

    /// Parse a taxonomy table held in memory.
    pub fn from_table_str(content: &str, format: &TaxonomyFormat) -> Result<Self> {
        let table = format.table.parse(content, TABLE)?;
        Self::from_raw(&table, format)
    }

    fn from_raw(table: &RawTable, format: &TaxonomyFormat) -> Result<Self> {
        let lineage_col = table.column_index(&format.lineage_column).ok_or_else(|| {
            MicrobiomeError::schema(
                TABLE,
                format!("required lineage column '{}' not found", format.lineage_column),
            )
        })?;
        let taxa = table.rows.iter().map(|row| {
            Taxon::from_lineage(row.id(table), row.field(lineage_col), format.rank_separator)
        });
        Ok(Self::from_taxa(taxa))
    }

    /// Number of taxa with a table entry.
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Look up a taxon by id.
    pub fn get(&self, feature_id: &str) -> Option<&Taxon> {
        self.taxa.get(feature_id)
    }

    /// Resolve taxa for the given features, in order.
    ///
    /// Features without a taxonomy entry are returned as unresolved taxa.
    pub fn resolve(&self, feature_ids: &[String]) -> Vec<Taxon> {
        feature_ids
            .iter()
            .map(|id| self.taxa.get(id).cloned().unwrap_or_else(|| Taxon::unresolved(id)))
            .collect()
    }
}
