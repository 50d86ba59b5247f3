use anyhow::{Context, Result};
use polars::prelude::*;

pub fn string_column(df: &DataFrame, col: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(col)
        .with_context(|| format!("column {col}"))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let utf8 = series.str()?;
    Ok(utf8
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

/// Cells that do not parse as numbers come back as `None`, as do NaNs.
pub fn f64_column(df: &DataFrame, col: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(col)
        .with_context(|| format!("column {col}"))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = series.f64()?;
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

pub fn rename_columns(df: &mut DataFrame, headers: &[String]) -> Result<()> {
    df.set_column_names(headers.iter().map(|h| h.as_str()))?;
    Ok(())
}
