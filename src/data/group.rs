//! Coffee-consumption group labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Group a sample is assigned to by curation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupLabel {
    /// Sample donor reports drinking coffee.
    Coffee,
    /// Sample donor reports not drinking coffee.
    NoCoffee,
    /// Missing, ambiguous or out-of-vocabulary answer.
    Unknown,
}

impl GroupLabel {
    /// All labels in report order.
    pub const ALL: [GroupLabel; 3] =
        [GroupLabel::Coffee, GroupLabel::NoCoffee, GroupLabel::Unknown];

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Coffee => "coffee",
            Self::NoCoffee => "no-coffee",
            Self::Unknown => "unknown",
        }
    }

    /// True for the two groups that take part in comparisons.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
