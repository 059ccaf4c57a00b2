//! Data profiling of abundance tables before analysis.

mod library_size;
mod prevalence;
mod sparsity;

pub use library_size::{profile_library_size, LibrarySizeProfile};
pub use prevalence::{profile_prevalence, PrevalenceProfile};
pub use sparsity::{profile_sparsity, SparsityProfile};

use crate::data::AbundanceMatrix;
use serde::{Deserialize, Serialize};

/// All profiles of one abundance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProfile {
    pub n_features: usize,
    pub n_samples: usize,
    /// True when every entry is a whole number (raw counts).
    pub integral: bool,
    pub sparsity: SparsityProfile,
    pub prevalence: PrevalenceProfile,
    pub library_size: LibrarySizeProfile,
}

impl std::fmt::Display for DataProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} taxa × {} samples ({})",
            self.n_features,
            self.n_samples,
            if self.integral { "counts" } else { "non-integer abundances" }
        )?;
        writeln!(f)?;
        write!(f, "{}", self.sparsity)?;
        writeln!(f)?;
        write!(f, "{}", self.prevalence)?;
        writeln!(f)?;
        write!(f, "{}", self.library_size)
    }
}

/// Profile sparsity, prevalence and depth of a table.
pub fn profile_matrix(matrix: &AbundanceMatrix) -> DataProfile {
    DataProfile {
        n_features: matrix.n_features(),
        n_samples: matrix.n_samples(),
        integral: matrix.is_integral(),
        sparsity: profile_sparsity(matrix),
        prevalence: profile_prevalence(matrix),
        library_size: profile_library_size(matrix),
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}
