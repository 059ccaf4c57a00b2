//! Coffee-consumption curation: raw dietary metadata to group labels.
//!
//! Source datasets encode coffee intake differently (frequency categories,
//! yes/no answers, cups per day), so the mapping is always an explicit
//! [`CoffeeVocabulary`] supplied by the operator. Values outside the
//! vocabulary become [`GroupLabel::Unknown`] and are tallied in the
//! [`CurationSummary`] instead of failing the run.

mod discover;
mod vocabulary;

pub use discover::{discover_coffee_fields, FieldCandidate, COFFEE_KEYWORDS};
pub use vocabulary::{CoffeeVocabulary, NumericRule};

use crate::data::{GroupLabel, Metadata, Variable};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Counts of samples per label bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationSummary {
    /// Metadata field the labels were derived from.
    pub field: String,
    pub coffee: usize,
    pub no_coffee: usize,
    /// All samples labelled unknown (missing, listed as unknown, or unrecognised).
    pub unknown: usize,
    /// Samples whose value was missing.
    pub missing: usize,
    /// Raw values outside the vocabulary with their sample counts.
    pub unrecognized: BTreeMap<String, usize>,
}

impl CurationSummary {
    /// Total number of curated samples.
    pub fn total(&self) -> usize {
        self.coffee + self.no_coffee + self.unknown
    }

    /// Count for one label.
    pub fn count(&self, label: GroupLabel) -> usize {
        match label {
            GroupLabel::Coffee => self.coffee,
            GroupLabel::NoCoffee => self.no_coffee,
            GroupLabel::Unknown => self.unknown,
        }
    }
}

impl std::fmt::Display for CurationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Curation of '{}'", self.field)?;
        writeln!(f, "  coffee:     {}", self.coffee)?;
        writeln!(f, "  no-coffee:  {}", self.no_coffee)?;
        writeln!(f, "  unknown:    {} ({} missing)", self.unknown, self.missing)?;
        for (value, n) in &self.unrecognized {
            writeln!(f, "    unrecognised '{}': {}", value, n)?;
        }
        Ok(())
    }
}

/// Labels in metadata sample order plus the bucket summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Curation {
    pub labels: Vec<GroupLabel>,
    pub summary: CurationSummary,
}

/// Derive a group label for every metadata sample.
///
/// Fails only when the vocabulary is inconsistent or its field is absent
/// from the metadata; individual values never fail.
pub fn curate(metadata: &Metadata, vocabulary: &CoffeeVocabulary) -> Result<Curation> {
    vocabulary.validate()?;
    let values = metadata.column(&vocabulary.field)?;

    let mut summary = CurationSummary {
        field: vocabulary.field.clone(),
        ..Default::default()
    };
    let labels: Vec<GroupLabel> = values
        .iter()
        .map(|value| {
            let label = match value {
                Variable::Missing => {
                    summary.missing += 1;
                    GroupLabel::Unknown
                }
                other => match vocabulary.classify(other) {
                    Some(label) => label,
                    None => {
                        let raw = other.raw().unwrap_or_default().to_string();
                        *summary.unrecognized.entry(raw).or_insert(0) += 1;
                        GroupLabel::Unknown
                    }
                },
            };
            match label {
                GroupLabel::Coffee => summary.coffee += 1,
                GroupLabel::NoCoffee => summary.no_coffee += 1,
                GroupLabel::Unknown => summary.unknown += 1,
            }
            label
        })
        .collect();

    info!(
        field = %summary.field,
        coffee = summary.coffee,
        no_coffee = summary.no_coffee,
        unknown = summary.unknown,
        missing = summary.missing,
        "curated coffee-consumption labels"
    );
    for (value, count) in &summary.unrecognized {
        warn!(
            field = %summary.field,
            value = %value,
            count,
            "value outside the vocabulary labelled unknown"
        );
    }

    Ok(Curation { labels, summary })
}
