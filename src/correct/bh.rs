//! Benjamini-Hochberg false discovery rate correction.

/// Benjamini-Hochberg adjusted p-values, in input order.
///
/// q[i] = min over ranks r >= rank(i) of p(r) * n / r, capped at 1.
pub fn adjust_bh(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return vec![];
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let n_f64 = n as f64;
    let mut q_values = vec![0.0; n];
    let mut running = 1.0_f64;
    // Start from largest p-value and work backwards
    for i in (0..n).rev() {
        let rank = (i + 1) as f64;
        let adjusted = p_values[indices[i]] * n_f64 / rank;
        running = running.min(adjusted).min(1.0);
        q_values[indices[i]] = running;
    }
    q_values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bh_ordering() {
        let p_values = vec![0.04, 0.01, 0.03, 0.005];
        let q_values = adjust_bh(&p_values);

        // 0.005 * 4 / 1
        assert_relative_eq!(q_values[3], 0.02, epsilon = 1e-10);
        // min(0.01 * 4 / 2, next)
        assert_relative_eq!(q_values[1], 0.02, epsilon = 1e-10);
        assert_relative_eq!(q_values[0], 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_known_values() {
        let p_values = vec![0.005, 0.01, 0.02, 0.04, 0.1];
        let q_values = adjust_bh(&p_values);

        assert_relative_eq!(q_values[0], 0.025, epsilon = 1e-10);
        assert_relative_eq!(q_values[1], 0.025, epsilon = 1e-10);
        assert_relative_eq!(q_values[2], 1.0 / 30.0, epsilon = 1e-10);
        assert_relative_eq!(q_values[3], 0.05, epsilon = 1e-10);
        assert_relative_eq!(q_values[4], 0.1, epsilon = 1e-10);
        assert_eq!(q_values.iter().filter(|&&q| q < 0.05).count(), 3);
    }

    #[test]
    fn test_bh_bounded() {
        let p_values = vec![0.5, 0.6, 0.7, 0.8, 0.9];
        for q in adjust_bh(&p_values) {
            assert!(q <= 1.0);
        }
    }

    #[test]
    fn test_bh_empty_and_single() {
        assert!(adjust_bh(&[]).is_empty());
        assert_relative_eq!(adjust_bh(&[0.05])[0], 0.05, epsilon = 1e-10);
    }
}
