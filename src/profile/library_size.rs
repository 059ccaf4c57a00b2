//! Sequencing depth (total abundance per sample) profiling.

use super::median;
use crate::data::AbundanceMatrix;
use serde::{Deserialize, Serialize};

/// Profile of per-sample total abundance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySizeProfile {
    pub n_samples: usize,
    /// Total abundance per sample.
    pub library_sizes: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Coefficient of variation (std_dev / mean).
    pub cv: f64,
    /// Log2 of max / min; `None` when some sample is empty.
    pub log2_fold_range: Option<f64>,
    /// Samples with zero total abundance.
    pub n_empty: usize,
    /// Samples below mean - 2 * std_dev.
    pub n_low_depth: usize,
    /// Samples above mean + 2 * std_dev.
    pub n_high_depth: usize,
}

impl LibrarySizeProfile {
    /// Coefficient of variation above 0.5.
    pub fn is_highly_variable(&self) -> bool {
        self.cv > 0.5
    }

    /// Indices of samples with total abundance below `threshold`.
    pub fn samples_below(&self, threshold: f64) -> Vec<usize> {
        (0..self.library_sizes.len())
            .filter(|&i| self.library_sizes[i] < threshold)
            .collect()
    }
}

impl std::fmt::Display for LibrarySizeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Library Size Profile")?;
        writeln!(f, "  Samples: {}", self.n_samples)?;
        writeln!(f, "  Mean:    {:.1}", self.mean)?;
        writeln!(f, "  Median:  {:.1}", self.median)?;
        writeln!(f, "  Std Dev: {:.1}", self.std_dev)?;
        writeln!(f, "  Min:     {}", self.min)?;
        writeln!(f, "  Max:     {}", self.max)?;
        writeln!(f, "  CV:      {:.2}", self.cv)?;
        match self.log2_fold_range {
            Some(range) => writeln!(f, "  Log2 fold range: {:.2}", range)?,
            None => writeln!(f, "  Log2 fold range: NA (empty samples)")?,
        }
        writeln!(f, "  Empty samples:      {}", self.n_empty)?;
        writeln!(f, "  Low depth samples:  {}", self.n_low_depth)?;
        writeln!(f, "  High depth samples: {}", self.n_high_depth)?;
        Ok(())
    }
}

/// Profile per-sample total abundance.
pub fn profile_library_size(matrix: &AbundanceMatrix) -> LibrarySizeProfile {
    let library_sizes = matrix.col_sums();
    let n_samples = library_sizes.len();
    if n_samples == 0 {
        return LibrarySizeProfile {
            n_samples: 0,
            library_sizes,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            cv: 0.0,
            log2_fold_range: None,
            n_empty: 0,
            n_low_depth: 0,
            n_high_depth: 0,
        };
    }

    let mean = library_sizes.iter().sum::<f64>() / n_samples as f64;
    let variance = library_sizes
        .iter()
        .map(|&x| (x - mean) * (x - mean))
        .sum::<f64>()
        / n_samples as f64;
    let std_dev = variance.sqrt();

    let min = library_sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = library_sizes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let low = mean - 2.0 * std_dev;
    let high = mean + 2.0 * std_dev;

    LibrarySizeProfile {
        n_samples,
        mean,
        median: median(&library_sizes),
        std_dev,
        min,
        max,
        cv: if mean > 0.0 { std_dev / mean } else { 0.0 },
        log2_fold_range: (min > 0.0).then(|| (max / min).log2()),
        n_empty: library_sizes.iter().filter(|&&x| x == 0.0).count(),
        n_low_depth: library_sizes.iter().filter(|&&x| x < low).count(),
        n_high_depth: library_sizes.iter().filter(|&&x| x > high).count(),
        library_sizes,
    }
}
