use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use polars::prelude::*;

/// Cell values read as missing, in every column.
pub const MISSING_TOKENS: [&str; 4] = ["", "NA", "NaN", "."];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else if header.contains(',') {
            Delimiter::Comma
        } else {
            Delimiter::Whitespace
        }
    }
}

/// Reads a study table with a header row. `.gz` and `.bz2` files are
/// decompressed on the fly; string cells come back trimmed.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let bytes = read_decoded(path)?;
    let delimiter = {
        let text = String::from_utf8_lossy(&bytes);
        let header = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .with_context(|| format!("{} is empty", path.display()))?;
        Delimiter::detect(header)
    };

    let df = match delimiter {
        Delimiter::Tab => read_delimited(bytes, b'\t'),
        Delimiter::Comma => read_delimited(bytes, b','),
        Delimiter::Whitespace => read_whitespace(&String::from_utf8_lossy(&bytes)),
    }
    .with_context(|| format!("read {}", path.display()))?;
    trim_string_columns(df)
}

/// Lists the regular, non-hidden files of `dir` in file-name order.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_none_or(|s| s.starts_with('.'));
        if !hidden && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_decoded(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let mut reader: Box<dyn Read> = match ext.as_str() {
        "gz" => Box::new(GzDecoder::new(file)),
        "bz2" => Box::new(BzDecoder::new(file)),
        _ => Box::new(file),
    };
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .with_context(|| format!("decode {}", path.display()))?;
    Ok(bytes)
}

fn read_delimited(bytes: Vec<u8>, separator: u8) -> Result<DataFrame> {
    let null_values = MISSING_TOKENS.iter().map(|t| (*t).into()).collect();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_ignore_errors(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_null_values(Some(NullValues::AllColumns(null_values)))
                .with_missing_is_null(true),
        )
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

// Whitespace-separated tables are small hand-written files; every column is
// read as text and cast later by the caller.
fn read_whitespace(text: &str) -> Result<DataFrame> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let headers = unique_headers(
        lines
            .next()
            .map(|l| l.split_whitespace().collect())
            .unwrap_or_default(),
    );
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for line in lines {
        let mut fields = line.split_whitespace();
        for col in columns.iter_mut() {
            col.push(fields.next().and_then(missing_to_none));
        }
    }

    let series: Vec<Series> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str().into(), values))
        .collect();
    Ok(DataFrame::from_iter(series))
}

// Repeated names get the same `_duplicated_<n>` suffix the CSV reader uses.
fn unique_headers(raw: Vec<&str>) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    raw.into_iter()
        .map(|name| {
            let count = seen.entry(name).or_insert(0);
            let out = if *count == 0 {
                name.to_string()
            } else {
                format!("{name}_duplicated_{}", *count - 1)
            };
            *count += 1;
            out
        })
        .collect()
}

fn missing_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    let missing = MISSING_TOKENS
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t));
    (!missing).then(|| value.to_string())
}

fn trim_string_columns(df: DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            let series = col.as_materialized_series();
            if series.dtype() != &DataType::String {
                return Ok(series.clone());
            }
            let trimmed = series
                .str()?
                .apply(|v| v.map(|s| Cow::Borrowed(s.trim())))
                .into_series();
            Ok(trimmed.with_name(series.name().clone()))
        })
        .collect::<Result<Vec<Series>>>()?;
    Ok(DataFrame::from_iter(columns))
}

/// Writes `df` as tab-separated text, creating the parent directory.
/// Nulls are written as `null_value`.
pub fn write_dataframe(df: &DataFrame, path: &Path, null_value: &str) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .with_separator(b'\t')
        .with_null_value(null_value.to_string())
        .finish(&mut df)?;
    Ok(())
}
