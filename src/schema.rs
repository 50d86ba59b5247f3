use std::collections::HashMap;

use crate::error::{MetaError, Result};

pub const PHENOTYPE: &str = "PHENOTYPE";
pub const SNP: &str = "SNP";
pub const EFFECT_ALLELE: &str = "EFFECT_ALLELE";
pub const NON_EFFECT_ALLELE: &str = "NON_EFFECT_ALLELE";
pub const BETA: &str = "BETA";
pub const BETA_SE: &str = "BETA_SE";
pub const OR: &str = "OR";
pub const OR_CI_LOWER: &str = "OR_95%CI_LOWER";
pub const OR_CI_UPPER: &str = "OR_95%CI_UPPER";
pub const P_VAL: &str = "P_VAL";

pub const REQUIRED_COLUMNS: [&str; 10] = [
    PHENOTYPE,
    SNP,
    EFFECT_ALLELE,
    NON_EFFECT_ALLELE,
    BETA,
    BETA_SE,
    OR,
    OR_CI_LOWER,
    OR_CI_UPPER,
    P_VAL,
];

pub const OUTPUT_COLUMNS: [&str; 10] = [
    PHENOTYPE,
    SNP,
    EFFECT_ALLELE,
    NON_EFFECT_ALLELE,
    BETA,
    BETA_SE,
    "P_VAL",
    "BH_P_VAL",
    "I_SQUARE",
    "Q_HET",
];

#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub headers: Vec<String>,
    pub info: Vec<String>,
}

pub fn normalize_headers(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| h.trim().to_ascii_uppercase())
        .collect()
}

/// Renames `headers` to the canonical column names and checks that every
/// required column is present exactly once.
///
/// `userprovided` maps a canonical name to the header used in the file.
pub fn resolve_column_map(
    headers: &[String],
    userprovided: &HashMap<String, String>,
    filename: &str,
) -> Result<ColumnMap> {
    let mut headers = normalize_headers(headers);
    let mut info = Vec::new();

    let mut user_map: Vec<(String, String)> = userprovided
        .iter()
        .map(|(k, v)| (k.trim().to_ascii_uppercase(), v.trim().to_ascii_uppercase()))
        .collect();
    user_map.sort();

    for (canonical, user_col) in &user_map {
        if !REQUIRED_COLUMNS.contains(&canonical.as_str()) {
            return Err(MetaError::InvalidArgument(format!(
                "{canonical} is not a recognised column name"
            )));
        }
        let mut matched = false;
        for h in headers.iter_mut() {
            if h == user_col {
                *h = canonical.clone();
                matched = true;
            }
        }
        if matched {
            info.push(format!(
                "Interpreting the {user_col} column as the {canonical} column in {filename}, as requested."
            ));
        }
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect();
    if !missing.is_empty() {
        return Err(MetaError::MissingColumn {
            file: filename.to_string(),
            columns: missing.join(", "),
        });
    }

    for col in REQUIRED_COLUMNS {
        let count = headers.iter().filter(|h| h.as_str() == col).count();
        if count > 1 {
            return Err(MetaError::InvalidArgument(format!(
                "Multiple columns interpreted as {col} in {filename}; rename the one you don't want interpreted as {col}"
            )));
        }
    }

    Ok(ColumnMap { headers, info })
}
