use std::collections::HashMap;

use anyhow::{Context, Result};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::types::PooledResult;

pub fn two_sided_p(normal: &Normal, beta: f64, se: f64) -> f64 {
    let z = beta / se;
    2.0 * normal.cdf(-z.abs())
}

pub fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).context("normal distribution")
}

/// Ascending ranks, tied values sharing the lowest rank of their run.
pub fn min_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0usize; values.len()];
    let mut run_rank = 1usize;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && values[idx] != values[order[pos - 1]] {
            run_rank = pos + 1;
        }
        ranks[idx] = run_rank;
    }
    ranks
}

/// `p * m / rank` for each p-value. There is no cumulative-minimum pass and
/// no clamping at 1, so adjusted values need not be monotone in rank.
pub fn bh_adjust(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    min_ranks(p_values)
        .into_iter()
        .zip(p_values)
        .map(|(rank, p)| p * m / rank as f64)
        .collect()
}

/// Fills `bh_p_value` for every result, adjusting each phenotype separately.
pub fn adjust_by_phenotype(results: &mut [PooledResult]) {
    let mut by_phenotype: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, result) in results.iter().enumerate() {
        by_phenotype
            .entry(result.phenotype.clone())
            .or_default()
            .push(i);
    }
    for indices in by_phenotype.values() {
        let p_values: Vec<f64> = indices.iter().map(|&i| results[i].p_value).collect();
        for (&i, bh) in indices.iter().zip(bh_adjust(&p_values)) {
            results[i].bh_p_value = bh;
        }
    }
}
