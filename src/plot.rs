use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use plotly::common::color::NamedColor;
use plotly::common::{DashType, ErrorData, ErrorType, Line, Marker, MarkerSymbol, Mode};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};

use crate::types::PooledResult;

pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestRow {
    pub label: String,
    pub beta: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Rows of the forest plot. Variants without heterogeneity statistics were
/// not meta-analysed and are left out.
pub fn forest_rows(results: &[PooledResult]) -> Vec<ForestRow> {
    results
        .iter()
        .filter(|r| r.heterogeneity.is_processed())
        .map(|r| ForestRow {
            label: format!("{} - {}", r.phenotype, r.variant_id),
            beta: r.beta_meta,
            lower: r.beta_meta - Z_95 * r.beta_se_meta,
            upper: r.beta_meta + Z_95 * r.beta_se_meta,
        })
        .collect()
}

/// Writes an HTML forest plot and returns the number of variants drawn.
/// Nothing is written when no variant qualifies.
pub fn write_forest_plot(results: &[PooledResult], path: &Path) -> Result<usize> {
    let rows = forest_rows(results);
    if rows.is_empty() {
        return Ok(0);
    }
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    // First result at the top.
    let k = rows.len();
    let y_vals: Vec<f64> = (0..k).map(|i| (k - i) as f64).collect();
    let betas: Vec<f64> = rows.iter().map(|r| r.beta).collect();
    let half_widths: Vec<f64> = rows.iter().map(|r| r.upper - r.beta).collect();
    let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();

    let mut plot = Plot::new();
    let null_line = Scatter::new(vec![0.0, 0.0], vec![0.5, k as f64 + 0.5])
        .mode(Mode::Lines)
        .line(
            Line::default()
                .color(NamedColor::DarkGray)
                .dash(DashType::Dash),
        )
        .show_legend(false);
    plot.add_trace(null_line);

    let estimates = Scatter::new(betas, y_vals.clone())
        .mode(Mode::Markers)
        .marker(
            Marker::new()
                .color(NamedColor::Black)
                .size(9)
                .symbol(MarkerSymbol::Diamond),
        )
        .error_x(ErrorData::new(ErrorType::Data).array(half_widths))
        .name("Beta (95% CI)");
    plot.add_trace(estimates);

    let x_axis = Axis::new().title("Beta").zero_line(false);
    let y_axis = Axis::new()
        .tick_values(y_vals)
        .tick_text(labels)
        .range(vec![0.0, k as f64 + 1.0]);
    let layout = Layout::new()
        .title("Beta-Meta Forest Plot")
        .x_axis(x_axis)
        .y_axis(y_axis)
        .show_legend(false);
    plot.set_layout(layout);
    plot.write_html(path);
    Ok(k)
}
