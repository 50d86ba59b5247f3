use crate::heterogeneity::analyze;
use crate::types::{Heterogeneity, PoolingModel, StudyRecord};

pub const DEFAULT_RANDOM_EFFECTS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEstimate {
    pub beta: f64,
    pub se: f64,
    pub heterogeneity: Heterogeneity,
    pub model: PoolingModel,
    pub tau_square: f64,
}

pub fn inverse_variance_weights(ses: &[f64]) -> Vec<f64> {
    ses.iter().map(|se| se.powi(-2)).collect()
}

/// Weighted mean and its standard error for the given weights.
pub fn weighted_estimate(weights: &[f64], betas: &[f64]) -> (f64, f64) {
    let sum_w: f64 = weights.iter().sum();
    let sum_wb: f64 = weights.iter().zip(betas).map(|(w, b)| w * b).sum();
    (sum_wb / sum_w, sum_w.powf(-0.5))
}

pub fn fixed_effect(betas: &[f64], ses: &[f64]) -> (f64, f64) {
    weighted_estimate(&inverse_variance_weights(ses), betas)
}

/// DerSimonian-Laird between-study variance, clamped at zero.
pub fn dersimonian_laird_tau_square(weights: &[f64], q: f64) -> f64 {
    let k = weights.len();
    if k < 2 {
        return 0.0;
    }
    let sum_w: f64 = weights.iter().sum();
    let sum_w2: f64 = weights.iter().map(|w| w * w).sum();
    let denom = sum_w - sum_w2 / sum_w;
    if !denom.is_finite() || denom <= 0.0 {
        return 0.0;
    }
    let tau = (q - (k - 1) as f64) / denom;
    if tau.is_finite() { tau.max(0.0) } else { 0.0 }
}

pub fn random_effects(weights: &[f64], betas: &[f64], tau_square: f64) -> (f64, f64) {
    let re_weights: Vec<f64> = weights.iter().map(|w| 1.0 / (1.0 / w + tau_square)).collect();
    weighted_estimate(&re_weights, betas)
}

pub fn pool_estimates(betas: &[f64], ses: &[f64], random_effects_threshold: f64) -> PoolEstimate {
    if betas.len() == 1 {
        return PoolEstimate {
            beta: betas[0],
            se: ses[0],
            heterogeneity: Heterogeneity::Unprocessed,
            model: PoolingModel::Single,
            tau_square: 0.0,
        };
    }

    let weights = inverse_variance_weights(ses);
    let (beta_fe, se_fe) = weighted_estimate(&weights, betas);
    let heterogeneity = analyze(&weights, betas, beta_fe);

    match heterogeneity {
        Heterogeneity::Computed { q, i_square } if i_square >= random_effects_threshold => {
            let tau_square = dersimonian_laird_tau_square(&weights, q);
            let (beta, se) = random_effects(&weights, betas, tau_square);
            PoolEstimate {
                beta,
                se,
                heterogeneity,
                model: PoolingModel::RandomEffects,
                tau_square,
            }
        }
        _ => PoolEstimate {
            beta: beta_fe,
            se: se_fe,
            heterogeneity,
            model: PoolingModel::FixedEffect,
            tau_square: 0.0,
        },
    }
}

pub fn pool_group(records: &[StudyRecord], random_effects_threshold: f64) -> PoolEstimate {
    let betas: Vec<f64> = records.iter().map(|r| r.beta).collect();
    let ses: Vec<f64> = records.iter().map(|r| r.beta_se).collect();
    pool_estimates(&betas, &ses, random_effects_threshold)
}
