use crate::types::{RawRecord, StudyRecord};

// Width of a two-sided 95% normal interval in SE units (2 * 1.959964).
pub const CI95_WIDTH: f64 = 3.92;

pub fn beta_from_odds_ratio(odds_ratio: f64, ci_lower: f64, ci_upper: f64) -> Option<(f64, f64)> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(odds_ratio) && usable(ci_lower) && usable(ci_upper)) {
        return None;
    }
    let beta = odds_ratio.ln();
    let se = (ci_upper.ln() - ci_lower.ln()) / CI95_WIDTH;
    Some((beta, se))
}

pub fn derive_record(record: &RawRecord) -> Option<StudyRecord> {
    let from_or = match (record.odds_ratio, record.ci_lower, record.ci_upper) {
        (Some(or), Some(lo), Some(hi)) => beta_from_odds_ratio(or, lo, hi),
        _ => None,
    };
    let (beta, beta_se) = match from_or {
        Some(pair) => pair,
        None => (record.beta?, record.beta_se?),
    };
    if !beta.is_finite() || !beta_se.is_finite() || beta_se <= 0.0 {
        return None;
    }
    Some(StudyRecord {
        phenotype: record.phenotype.clone(),
        variant_id: record.variant_id.clone(),
        effect_allele: record.effect_allele,
        non_effect_allele: record.non_effect_allele,
        beta,
        beta_se,
        p_value: record.p_value,
    })
}

/// Converts every record to beta/SE form. Returns the converted records and
/// the rows that could not be resolved.
pub fn derive_effect_sizes(records: &[RawRecord]) -> (Vec<StudyRecord>, Vec<&RawRecord>) {
    let mut derived = Vec::with_capacity(records.len());
    let mut unresolved = Vec::new();
    for record in records {
        match derive_record(record) {
            Some(study) => derived.push(study),
            None => unresolved.push(record),
        }
    }
    (derived, unresolved)
}
