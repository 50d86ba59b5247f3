use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use anyhow::Result;
use polars::prelude::*;

use crate::df_utils::{f64_column, rename_columns, string_column};
use crate::io::{list_input_files, read_table};
use crate::logging::{log_line, warn_line};
use crate::schema::{self, resolve_column_map};
use crate::types::{Allele, RawRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub files_read: usize,
    pub files_skipped: Vec<String>,
    pub rows_read: usize,
    pub invalid_rows: usize,
    pub duplicates_removed: usize,
}

pub fn parse_allele(value: &str) -> Option<Allele> {
    Allele::parse(value).or_else(|| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Allele::from_code)
    })
}

/// Loads and normalizes every study file in `dir`.
///
/// Files that cannot be read or lack a required column are skipped with a
/// warning; the run carries on with the rest.
pub fn load_studies(
    dir: &Path,
    column_names: &HashMap<String, String>,
    log: &mut File,
) -> Result<(Vec<RawRecord>, NormalizeReport)> {
    let mut report = NormalizeReport::default();
    let mut records = Vec::new();

    for file in list_input_files(dir)? {
        let name = file
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<unknown>")
            .to_string();

        let mut df = match read_table(&file) {
            Ok(df) => df,
            Err(err) => {
                warn_line(log, &format!("Skipping {name}: could not read table ({err:#})"))?;
                report.files_skipped.push(name);
                continue;
            }
        };

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = match resolve_column_map(&headers, column_names, &name) {
            Ok(map) => map,
            Err(err) => {
                warn_line(log, &format!("Skipping {name}: {err}"))?;
                report.files_skipped.push(name);
                continue;
            }
        };
        for msg in &map.info {
            log_line(log, msg, true)?;
        }
        if let Err(err) = rename_columns(&mut df, &map.headers) {
            warn_line(log, &format!("Skipping {name}: {err:#}"))?;
            report.files_skipped.push(name);
            continue;
        }

        let (rows, invalid) = records_from_frame(&df, &name)?;
        report.files_read += 1;
        report.rows_read += df.height();
        report.invalid_rows += invalid;
        if invalid > 0 {
            warn_line(
                log,
                &format!(
                    "{invalid} row(s) were removed from {name} due to alleles outside A/C/G/T or a missing PHENOTYPE/SNP"
                ),
            )?;
        }
        log_line(
            log,
            &format!("Read {} usable row(s) from {name}", rows.len()),
            true,
        )?;
        records.extend(rows);
    }

    let (records, removed) = deduplicate(records);
    report.duplicates_removed = removed;
    if removed > 0 {
        log_line(log, &format!("{removed} duplicate row(s) were removed"), true)?;
    }
    Ok((records, report))
}

/// Extracts the required columns of an already renamed frame. Returns the
/// valid rows and the number of rows flagged as invalid.
pub fn records_from_frame(df: &DataFrame, source: &str) -> Result<(Vec<RawRecord>, usize)> {
    let phenotype = string_column(df, schema::PHENOTYPE)?;
    let snp = string_column(df, schema::SNP)?;
    let effect = string_column(df, schema::EFFECT_ALLELE)?;
    let non_effect = string_column(df, schema::NON_EFFECT_ALLELE)?;
    let beta = f64_column(df, schema::BETA)?;
    let beta_se = f64_column(df, schema::BETA_SE)?;
    let odds_ratio = f64_column(df, schema::OR)?;
    let ci_lower = f64_column(df, schema::OR_CI_LOWER)?;
    let ci_upper = f64_column(df, schema::OR_CI_UPPER)?;
    let p_value = f64_column(df, schema::P_VAL)?;

    let mut out = Vec::with_capacity(df.height());
    let mut invalid = 0usize;
    for i in 0..df.height() {
        let alleles = (
            effect[i].as_deref().and_then(parse_allele),
            non_effect[i].as_deref().and_then(parse_allele),
        );
        let ids = (
            phenotype[i].as_deref().filter(|s| !s.is_empty()),
            snp[i].as_deref().filter(|s| !s.is_empty()),
        );
        match (alleles, ids) {
            ((Some(effect_allele), Some(non_effect_allele)), (Some(pheno), Some(variant))) => {
                out.push(RawRecord {
                    phenotype: pheno.to_string(),
                    variant_id: variant.to_string(),
                    effect_allele,
                    non_effect_allele,
                    beta: beta[i],
                    beta_se: beta_se[i],
                    odds_ratio: odds_ratio[i],
                    ci_lower: ci_lower[i],
                    ci_upper: ci_upper[i],
                    p_value: p_value[i],
                    source: source.to_string(),
                });
            }
            _ => invalid += 1,
        }
    }
    Ok((out, invalid))
}

type DedupKey = (
    String,
    String,
    Allele,
    Allele,
    [Option<u64>; 6],
);

fn dedup_key(record: &RawRecord) -> DedupKey {
    let numeric = [
        record.beta,
        record.beta_se,
        record.odds_ratio,
        record.ci_lower,
        record.ci_upper,
        record.p_value,
    ]
    .map(|v| v.map(f64::to_bits));
    (
        record.phenotype.clone(),
        record.variant_id.clone(),
        record.effect_allele,
        record.non_effect_allele,
        numeric,
    )
}

/// Keeps the first of every set of rows agreeing on phenotype, SNP, alleles
/// and every numeric column. Rows reporting only an odds ratio therefore stay
/// distinct as long as their OR or interval differs.
pub fn deduplicate(records: Vec<RawRecord>) -> (Vec<RawRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| seen.insert(dedup_key(r)))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
