//! Pseudocount addition for zero handling.

use crate::data::AbundanceMatrix;
use crate::error::{MicrobiomeError, Result};
use nalgebra::DMatrix;

/// Add a pseudocount to all entries, converting to a dense matrix.
///
/// The pseudocount is added to zero and non-zero entries alike so ratios
/// between abundant taxa are barely disturbed. There is no default: the
/// value has to come from the analysis configuration.
pub fn add_pseudocount(matrix: &AbundanceMatrix, pseudocount: f64) -> Result<DMatrix<f64>> {
    if !(pseudocount > 0.0 && pseudocount.is_finite()) {
        return Err(MicrobiomeError::InvalidParameter(format!(
            "Pseudocount must be positive and finite, got {}",
            pseudocount
        )));
    }

    Ok(matrix.to_dense().add_scalar(pseudocount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_matrix() -> AbundanceMatrix {
        AbundanceMatrix::from_rows(
            &[vec![10.0, 20.0, 0.0], vec![5.0, 0.0, 15.0]],
            vec!["A".into(), "B".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_add_pseudocount() {
        let matrix = create_test_matrix();
        let result = add_pseudocount(&matrix, 0.5).unwrap();

        assert_eq!(result.nrows(), 2);
        assert_eq!(result.ncols(), 3);
        assert!((result[(0, 0)] - 10.5).abs() < 1e-10);
        assert!((result[(0, 2)] - 0.5).abs() < 1e-10); // was zero
        assert!((result[(1, 1)] - 0.5).abs() < 1e-10); // was zero
    }

    #[test]
    fn test_invalid_pseudocount() {
        let matrix = create_test_matrix();
        assert!(add_pseudocount(&matrix, 0.0).is_err());
        assert!(add_pseudocount(&matrix, -1.0).is_err());
        assert!(add_pseudocount(&matrix, f64::NAN).is_err());
    }
}
