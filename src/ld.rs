use std::collections::HashSet;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::info;

use crate::df_utils::string_column;
use crate::error::MetaError;
use crate::io::{read_table, write_dataframe};
use crate::qc::check_file_exists;
use crate::types::PooledResult;

pub const RSCRIPT_ENV_BIN: &str = "BETAMETA_RSCRIPT";
pub const DEFAULT_RSCRIPT_BIN: &str = "Rscript";

/// Source of linkage-disequilibrium annotation for a list of SNP ids.
pub trait LdAnnotationProvider {
    fn annotate(&self, snps: &[String]) -> Result<DataFrame>;
}

/// Runs an R script as `Rscript <script> <snp_list> <output_table>` and
/// reads the table it leaves behind.
#[derive(Debug, Clone)]
pub struct RscriptProvider {
    pub executable: PathBuf,
    pub script: PathBuf,
}

impl RscriptProvider {
    pub fn new(script: impl Into<PathBuf>, executable: Option<PathBuf>) -> Result<Self> {
        let script = script.into();
        check_file_exists(&script, "script")?;
        let executable = match executable {
            Some(path) => path,
            None => resolve_rscript().ok_or_else(|| {
                MetaError::ExternalTool(format!(
                    "could not find {DEFAULT_RSCRIPT_BIN} on PATH (set {RSCRIPT_ENV_BIN} to override)"
                ))
            })?,
        };
        Ok(Self { executable, script })
    }
}

impl LdAnnotationProvider for RscriptProvider {
    fn annotate(&self, snps: &[String]) -> Result<DataFrame> {
        let mut snp_file = NamedTempFile::new().context("create SNP list file")?;
        for snp in snps {
            writeln!(snp_file, "{snp}")?;
        }
        snp_file.flush()?;
        let out_file = NamedTempFile::new().context("create LD output file")?;

        info!(
            "Running {} {} on {} SNP(s)",
            self.executable.display(),
            self.script.display(),
            snps.len()
        );
        let output = Command::new(&self.executable)
            .arg(&self.script)
            .arg(snp_file.path())
            .arg(out_file.path())
            .output()
            .map_err(|e| {
                MetaError::ExternalTool(format!(
                    "could not execute '{}' (set {RSCRIPT_ENV_BIN} to override): {e}",
                    self.executable.display()
                ))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MetaError::ExternalTool(format!(
                "'{}' exited with {}: {stderr}",
                self.executable.display(),
                output.status
            ))
            .into());
        }
        read_table(out_file.path())
    }
}

/// Interpreter named by the env override, else the first match on PATH.
pub fn resolve_rscript() -> Option<PathBuf> {
    if let Ok(path) = env::var(RSCRIPT_ENV_BIN)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path.trim()));
    }
    let paths = env::var_os("PATH")?;
    find_in_dirs(env::split_paths(&paths), DEFAULT_RSCRIPT_BIN)
}

pub fn find_in_dirs<I>(dirs: I, name: &str) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let candidates = [name.to_string(), format!("{name}.exe")];
    dirs.into_iter().find_map(|dir| {
        candidates
            .iter()
            .map(|c| dir.join(c))
            .find(|p| p.is_file())
    })
}

/// Reads a SNP list: either a table with a `SNP` column or one id per line.
pub fn read_snp_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let first = text.lines().next().unwrap_or("").trim().to_ascii_uppercase();
    let has_header = first
        .split(|c: char| c == '\t' || c == ',' || c.is_whitespace())
        .any(|h| h == "SNP");
    if has_header {
        let df = read_table(path)?;
        let name = df
            .get_column_names()
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case("SNP"))
            .map(|c| c.to_string())
            .context("SNP column")?;
        return string_column(&df, &name)
            .map(|v| v.into_iter().flatten().filter(|s| !s.is_empty()).collect());
    }
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Unique SNP ids of the pooled results, in result order.
pub fn result_snps(results: &[PooledResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.variant_id.clone()))
        .map(|r| r.variant_id.clone())
        .collect()
}

pub fn annotate_results<P: LdAnnotationProvider + ?Sized>(
    results: &[PooledResult],
    provider: &P,
) -> Result<DataFrame> {
    provider.annotate(&result_snps(results))
}

/// Annotates the SNPs of `results` and writes the provider's table to
/// `path`. Returns the number of annotation rows written.
pub fn write_result_annotation<P: LdAnnotationProvider + ?Sized>(
    results: &[PooledResult],
    provider: &P,
    path: &Path,
) -> Result<usize> {
    let table = annotate_results(results, provider)?;
    write_dataframe(&table, path, "NA")?;
    info!("LD annotation for {} SNP(s) written to {}", table.height(), path.display());
    Ok(table.height())
}
