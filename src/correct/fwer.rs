//! Family-wise error rate corrections.

/// Bonferroni: p * n, capped at 1.
pub fn adjust_bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len() as f64;
    p_values.iter().map(|&p| (p * n).min(1.0)).collect()
}

/// Holm step-down, in input order.
///
/// Sorted ascending, the k-th p-value (0-based) is multiplied by n - k and
/// the running maximum is kept so adjusted values stay monotone.
pub fn adjust_holm(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted = vec![0.0; n];
    let mut running = 0.0_f64;
    for (k, &idx) in indices.iter().enumerate() {
        let adj = (p_values[idx] * (n - k) as f64).min(1.0);
        running = running.max(adj);
        adjusted[idx] = running;
    }
    adjusted
}
