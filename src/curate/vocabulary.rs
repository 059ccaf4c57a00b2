//! Operator-supplied mapping from raw metadata values to group labels.

use crate::data::{GroupLabel, Variable};
use crate::error::{MicrobiomeError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds for numeric intake fields (e.g. cups per day).
///
/// Values `<= no_coffee_at_most` are no-coffee, values `>= coffee_at_least`
/// are coffee, anything in between is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRule {
    pub no_coffee_at_most: f64,
    pub coffee_at_least: f64,
}

/// Mapping from the raw values of one metadata field to group labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoffeeVocabulary {
    /// Metadata field holding the coffee answer.
    pub field: String,
    /// Raw values meaning the donor drinks coffee.
    pub coffee: Vec<String>,
    /// Raw values meaning the donor does not drink coffee.
    pub no_coffee: Vec<String>,
    /// Raw values that are known placeholders and map to unknown silently.
    #[serde(default)]
    pub unknown: Vec<String>,
    /// Optional thresholds for numeric fields.
    #[serde(default)]
    pub numeric: Option<NumericRule>,
    /// Compare raw values ignoring ASCII case.
    pub case_insensitive: bool,
}

impl CoffeeVocabulary {
    /// Reject vocabularies that could assign one value to two labels.
    pub fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(MicrobiomeError::InvalidParameter(
                "coffee vocabulary field name is empty".to_string(),
            ));
        }
        if self.coffee.is_empty() && self.no_coffee.is_empty() && self.numeric.is_none() {
            return Err(MicrobiomeError::InvalidParameter(format!(
                "coffee vocabulary for '{}' maps no value to either group",
                self.field
            )));
        }
        let lists: [(&str, &[String]); 3] = [
            ("coffee", &self.coffee),
            ("no_coffee", &self.no_coffee),
            ("unknown", &self.unknown),
        ];
        for (i, (name_a, a)) in lists.iter().enumerate() {
            for (name_b, b) in &lists[i + 1..] {
                if let Some(value) = a.iter().find(|v| b.iter().any(|w| self.matches(w, v))) {
                    return Err(MicrobiomeError::InvalidParameter(format!(
                        "coffee vocabulary value '{}' is listed under both '{}' and '{}'",
                        value, name_a, name_b
                    )));
                }
            }
        }
        if let Some(rule) = &self.numeric {
            if !rule.no_coffee_at_most.is_finite() || !rule.coffee_at_least.is_finite() {
                return Err(MicrobiomeError::InvalidParameter(
                    "numeric coffee thresholds must be finite".to_string(),
                ));
            }
            if rule.no_coffee_at_most >= rule.coffee_at_least {
                return Err(MicrobiomeError::InvalidParameter(format!(
                    "no_coffee_at_most ({}) must be below coffee_at_least ({})",
                    rule.no_coffee_at_most, rule.coffee_at_least
                )));
            }
        }
        Ok(())
    }

    /// Label for a non-missing value, or `None` when outside the vocabulary.
    ///
    /// Listed values are compared with the text as written in the table;
    /// only [`NumericRule`] looks at the parsed number.
    pub fn classify(&self, value: &Variable) -> Option<GroupLabel> {
        if let (Some(rule), Some(x)) = (&self.numeric, value.as_continuous()) {
            if x <= rule.no_coffee_at_most {
                return Some(GroupLabel::NoCoffee);
            }
            if x >= rule.coffee_at_least {
                return Some(GroupLabel::Coffee);
            }
        }

        let raw = value.raw()?.trim();
        if self.coffee.iter().any(|v| self.matches(v, raw)) {
            Some(GroupLabel::Coffee)
        } else if self.no_coffee.iter().any(|v| self.matches(v, raw)) {
            Some(GroupLabel::NoCoffee)
        } else if self.unknown.iter().any(|v| self.matches(v, raw)) {
            Some(GroupLabel::Unknown)
        } else {
            None
        }
    }

    fn matches(&self, listed: &str, raw: &str) -> bool {
        let listed = listed.trim();
        if self.case_insensitive {
            listed.eq_ignore_ascii_case(raw)
        } else {
            listed == raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> CoffeeVocabulary {
        CoffeeVocabulary {
            field: "coffee".to_string(),
            coffee: vec!["Yes".to_string()],
            no_coffee: vec!["No".to_string()],
            unknown: vec!["Unspecified".to_string()],
            numeric: None,
            case_insensitive: true,
        }
    }

    #[test]
    fn test_classify() {
        let v = vocab();
        assert_eq!(v.classify(&Variable::Categorical("yes".into())), Some(GroupLabel::Coffee));
        assert_eq!(v.classify(&Variable::Categorical(" NO ".into())), Some(GroupLabel::NoCoffee));
        assert_eq!(
            v.classify(&Variable::Categorical("unspecified".into())),
            Some(GroupLabel::Unknown)
        );
        assert_eq!(v.classify(&Variable::Categorical("sometimes".into())), None);
    }

    #[test]
    fn test_numeric_codes_match_as_written() {
        let v = CoffeeVocabulary {
            field: "coffee".to_string(),
            coffee: vec!["01".to_string(), "1.0".to_string()],
            no_coffee: vec!["00".to_string()],
            unknown: vec![],
            numeric: None,
            case_insensitive: false,
        };
        let code = |raw: &str| Variable::Continuous {
            value: raw.parse().unwrap(),
            raw: raw.to_string(),
        };
        assert_eq!(v.classify(&code("01")), Some(GroupLabel::Coffee));
        assert_eq!(v.classify(&code("1.0")), Some(GroupLabel::Coffee));
        assert_eq!(v.classify(&code("00")), Some(GroupLabel::NoCoffee));
        assert_eq!(v.classify(&code("1")), None);
        assert_eq!(v.classify(&Variable::Missing), None);
    }

    #[test]
    fn test_overlap_rejected() {
        let mut v = vocab();
        v.no_coffee.push("YES".to_string());
        let err = v.validate().unwrap_err();
        assert!(err.to_string().contains("'Yes'"));
    }

    #[test]
    fn test_inverted_numeric_rule_rejected() {
        let mut v = vocab();
        v.numeric = Some(NumericRule {
            no_coffee_at_most: 2.0,
            coffee_at_least: 1.0,
        });
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let v = CoffeeVocabulary {
            field: "coffee".to_string(),
            coffee: vec![],
            no_coffee: vec![],
            unknown: vec![],
            numeric: None,
            case_insensitive: false,
        };
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_yaml_requires_case_flag() {
        let yaml = "field: coffee\ncoffee: [yes]\nno_coffee: [no]\n";
        assert!(serde_yaml::from_str::<CoffeeVocabulary>(yaml).is_err());
    }
}
