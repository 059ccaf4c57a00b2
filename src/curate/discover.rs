//! Locating coffee-related fields in unfamiliar metadata.

use crate::data::{Metadata, VariableType};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Substrings (case-insensitive) that mark a field as a candidate.
pub const COFFEE_KEYWORDS: [&str; 3] = ["coffee", "caffeine", "beverage"];

/// Number of values shown per field in text output.
const PREVIEW: usize = 10;

/// A metadata field whose name suggests coffee intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub field: String,
    pub variable_type: VariableType,
    pub n_present: usize,
    pub n_missing: usize,
    /// Distinct raw values, sorted.
    pub levels: Vec<String>,
}

impl std::fmt::Display for FieldCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.variable_type {
            VariableType::Categorical => "categorical",
            VariableType::Continuous => "numeric",
        };
        writeln!(
            f,
            "{} ({}): {} present, {} missing, {} distinct",
            self.field,
            kind,
            self.n_present,
            self.n_missing,
            self.levels.len()
        )?;
        let shown: Vec<&str> = self.levels.iter().take(PREVIEW).map(String::as_str).collect();
        write!(f, "    values: {}", shown.join(" | "))?;
        if self.levels.len() > PREVIEW {
            write!(f, " | ...")?;
        }
        writeln!(f)
    }
}

/// Fields whose name contains one of [`COFFEE_KEYWORDS`], in column order.
///
/// The listed values are what a vocabulary has to be written against.
pub fn discover_coffee_fields(metadata: &Metadata) -> Result<Vec<FieldCandidate>> {
    let mut candidates = Vec::new();
    for name in metadata.column_names() {
        let lower = name.to_ascii_lowercase();
        if !COFFEE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        let values = metadata.column(name)?;
        let n_missing = values.iter().filter(|v| v.is_missing()).count();
        candidates.push(FieldCandidate {
            field: name.clone(),
            variable_type: metadata
                .column_type(name)
                .unwrap_or(VariableType::Categorical),
            n_present: values.len() - n_missing,
            n_missing,
            levels: metadata.levels(name)?,
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TableFormat;

    #[test]
    fn test_keyword_fields_found() {
        let content = "\
#SampleID\tCoffee_Frequency\tage\tcaffeine_mg\tbeverage_type
S1\tDaily\t30\t200\ttea
S2\tNever\t41\t0\tcoffee
S3\tNot provided\t25\t080\tcoffee
";
        let meta = Metadata::from_table_str(content, &TableFormat::tsv("#SampleID")).unwrap();
        let found = discover_coffee_fields(&meta).unwrap();

        let names: Vec<&str> = found.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, vec!["Coffee_Frequency", "caffeine_mg", "beverage_type"]);

        assert_eq!(found[0].levels, vec!["Daily", "Never"]);
        assert_eq!(found[0].n_missing, 1);
        assert_eq!(found[1].variable_type, VariableType::Continuous);
        assert_eq!(found[1].levels, vec!["0", "080", "200"]);
        assert_eq!(found[2].n_present, 3);
        assert!(found[0].to_string().contains("values: Daily | Never"));
    }

    #[test]
    fn test_no_candidates() {
        let meta = Metadata::from_table_str("id\tage\nS1\t3\n", &TableFormat::tsv("id")).unwrap();
        assert!(discover_coffee_fields(&meta).unwrap().is_empty());
    }
}
