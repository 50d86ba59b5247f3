use crate::types::Heterogeneity;

pub fn cochran_q(weights: &[f64], betas: &[f64], beta_fixed: f64) -> f64 {
    weights
        .iter()
        .zip(betas)
        .map(|(w, b)| w * (b - beta_fixed).powi(2))
        .sum()
}

/// Higgins' I² in percent, floored at zero. `None` when Q is zero.
pub fn i_square(q: f64, n: usize) -> Option<f64> {
    if q == 0.0 || n < 2 {
        return None;
    }
    let df = (n - 1) as f64;
    Some((100.0 * (q - df) / q).max(0.0))
}

pub fn analyze(weights: &[f64], betas: &[f64], beta_fixed: f64) -> Heterogeneity {
    let n = betas.len();
    if n < 2 {
        return Heterogeneity::Unprocessed;
    }
    let q = cochran_q(weights, betas, beta_fixed);
    match i_square(q, n) {
        Some(i_square) => Heterogeneity::Computed { q, i_square },
        None => Heterogeneity::NoVariation,
    }
}
