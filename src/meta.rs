use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use polars::prelude::*;

use crate::derive::derive_effect_sizes;
use crate::direction::reconcile;
use crate::error::MetaError;
use crate::io::write_dataframe;
use crate::logging::{log_line, log_path, open_log, warn_line};
use crate::normalize::{NormalizeReport, load_studies};
use crate::plot::write_forest_plot;
use crate::pool::{DEFAULT_RANDOM_EFFECTS_THRESHOLD, pool_group};
use crate::qc::{check_dir_exists, check_range_f64};
use crate::schema::OUTPUT_COLUMNS;
use crate::significance::{adjust_by_phenotype, standard_normal, two_sided_p};
use crate::types::{PooledResult, PoolingModel, RawRecord, ReconcileStrategy, VariantGroup};

pub const UNPROCESSED: &str = "Unprocessed";

#[derive(Debug, Clone)]
pub struct MetaConfig {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub forest_plot: Option<PathBuf>,
    pub strategy: ReconcileStrategy,
    pub random_effects_threshold: f64,
    pub column_names: HashMap<String, String>,
    pub log_name: Option<String>,
}

impl MetaConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output: output.into(),
            forest_plot: None,
            strategy: ReconcileStrategy::default(),
            random_effects_threshold: DEFAULT_RANDOM_EFFECTS_THRESHOLD,
            column_names: HashMap::new(),
            log_name: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetaReport {
    pub normalize: NormalizeReport,
    pub unresolved_records: usize,
    pub incompatible_records: usize,
    pub groups: usize,
    pub random_effects_groups: usize,
    pub plotted_groups: usize,
}

#[derive(Debug, Clone)]
pub struct MetaOutput {
    pub results: Vec<PooledResult>,
    pub report: MetaReport,
}

pub fn run_meta(config: &MetaConfig) -> Result<MetaOutput> {
    check_dir_exists(&config.input_dir, "input_dir")?;
    check_range_f64(
        config.random_effects_threshold,
        0.0,
        100.0,
        "random_effects_threshold",
    )?;

    let mut log = open_log(&log_path(&config.output, config.log_name.as_deref()))?;
    log_line(
        &mut log,
        &format!(
            "Meta-analysis of studies in {} started.",
            config.input_dir.display()
        ),
        true,
    )?;

    let mut report = MetaReport::default();
    let (raw, normalize_report) =
        load_studies(&config.input_dir, &config.column_names, &mut log)?;
    report.normalize = normalize_report;
    if raw.is_empty() {
        warn_line(&mut log, "No usable records after normalization; nothing to pool.")?;
        return Err(MetaError::NoUsableRecords("after normalization".into()).into());
    }

    let (records, unresolved) = derive_effect_sizes(&raw);
    report.unresolved_records = unresolved.len();
    for (source, count) in count_by_source(&unresolved) {
        log_line(
            &mut log,
            &format!("{count} row(s) from {source} were removed because neither BETA/BETA_SE nor OR/CI resolved to a finite estimate"),
            true,
        )?;
    }
    if records.is_empty() {
        warn_line(&mut log, "No record has a usable beta and standard error; nothing to pool.")?;
        return Err(MetaError::NoUsableRecords("with a finite beta and standard error".into()).into());
    }

    let (groups, incompatible) = reconcile(records, config.strategy);
    report.incompatible_records = incompatible;
    if incompatible > 0 {
        log_line(
            &mut log,
            &format!("{incompatible} row(s) were removed due to alleles that could not be aligned within their variant"),
            true,
        )?;
    }
    if groups.is_empty() {
        return Err(MetaError::NoUsableRecords("after allele reconciliation".into()).into());
    }

    let results = pool_groups(&groups, config.random_effects_threshold)?;
    report.groups = results.len();
    report.random_effects_groups = results
        .iter()
        .filter(|r| r.model == PoolingModel::RandomEffects)
        .count();
    log_line(
        &mut log,
        &format!(
            "Pooled {} variant(s); {} used the random-effects model.",
            report.groups, report.random_effects_groups
        ),
        true,
    )?;

    write_results(&results, &config.output)?;
    log_line(
        &mut log,
        &format!("Results written to {}", config.output.display()),
        true,
    )?;

    if let Some(plot) = &config.forest_plot {
        report.plotted_groups = write_forest_plot(&results, plot)?;
        if report.plotted_groups == 0 {
            warn_line(&mut log, "No variant had heterogeneity statistics; forest plot skipped.")?;
        } else {
            log_line(
                &mut log,
                &format!("Forest plot written to {}", plot.display()),
                true,
            )?;
        }
    }

    Ok(MetaOutput { results, report })
}

// Per-file counts, in order of first appearance.
fn count_by_source<'a>(rows: &[&'a RawRecord]) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|(s, _)| *s == row.source) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.source.as_str(), 1)),
        }
    }
    counts
}

/// Pools every group and fills p-values and per-phenotype BH p-values.
pub fn pool_groups(groups: &[VariantGroup], random_effects_threshold: f64) -> Result<Vec<PooledResult>> {
    let normal = standard_normal()?;
    let mut results: Vec<PooledResult> = groups
        .iter()
        .map(|group| {
            let estimate = pool_group(&group.records, random_effects_threshold);
            // Without I² nothing was meta-analysed, so the first study's own
            // p-value is reported.
            let p_value = if estimate.heterogeneity.is_processed() {
                two_sided_p(&normal, estimate.beta, estimate.se)
            } else {
                group
                    .records
                    .first()
                    .and_then(|r| r.p_value)
                    .unwrap_or_else(|| two_sided_p(&normal, estimate.beta, estimate.se))
            };
            PooledResult {
                phenotype: group.key.phenotype.clone(),
                variant_id: group.key.variant_id.clone(),
                effect_allele: group.reference.0,
                non_effect_allele: group.reference.1,
                beta_meta: estimate.beta,
                beta_se_meta: estimate.se,
                heterogeneity: estimate.heterogeneity,
                model: estimate.model,
                n_studies: group.records.len(),
                p_value,
                bh_p_value: f64::NAN,
            }
        })
        .collect();
    adjust_by_phenotype(&mut results);
    Ok(results)
}

pub fn results_to_frame(results: &[PooledResult]) -> Result<DataFrame> {
    let [pheno, snp, ea, nea, beta, se, p, bh, i2, q] = OUTPUT_COLUMNS;
    let columns = vec![
        Series::new(pheno.into(), results.iter().map(|r| r.phenotype.clone()).collect::<Vec<_>>()),
        Series::new(snp.into(), results.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>()),
        Series::new(ea.into(), results.iter().map(|r| r.effect_allele.as_str()).collect::<Vec<_>>()),
        Series::new(nea.into(), results.iter().map(|r| r.non_effect_allele.as_str()).collect::<Vec<_>>()),
        Series::new(beta.into(), results.iter().map(|r| r.beta_meta).collect::<Vec<_>>()),
        Series::new(se.into(), results.iter().map(|r| r.beta_se_meta).collect::<Vec<_>>()),
        Series::new(p.into(), results.iter().map(|r| r.p_value).collect::<Vec<_>>()),
        Series::new(bh.into(), results.iter().map(|r| r.bh_p_value).collect::<Vec<_>>()),
        Series::new(i2.into(), results.iter().map(|r| r.heterogeneity.i_square()).collect::<Vec<_>>()),
        Series::new(q.into(), results.iter().map(|r| r.heterogeneity.q()).collect::<Vec<_>>()),
    ];
    Ok(DataFrame::from_iter(columns))
}

/// Writes the result table as tab-separated text. Missing heterogeneity
/// statistics are written as `Unprocessed`.
pub fn write_results(results: &[PooledResult], path: &Path) -> Result<()> {
    let df = results_to_frame(results)?;
    write_dataframe(&df, path, UNPROCESSED)
}
