//! Correlation and trendline statistics over the global dataset.
//!
//! These are the numbers the dashboard draws next to its scatter plots:
//! the Pearson coefficient and an ordinary least squares line, overall and
//! per income group.

use std::collections::BTreeSet;

use polars::prelude::cov::{cov, pearson_corr};
use polars::prelude::*;
use serde::Serialize;
use shd_common::{column_f64_values, column_text_values};

use crate::error::{Result, TransformError};

/// Income groups in display order.
pub const INCOME_GROUPS: [&str; 4] = ["LI", "LM", "UM", "HI"];

/// Label of the all-rows group.
pub const ALL_GROUPS: &str = "all";

/// `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Statistics for one group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub group: String,
    /// Rows where both values are present.
    pub pairs: usize,
    pub pearson_r: Option<f64>,
    pub trendline: Option<Trendline>,
}

/// Headline numbers for one indicator column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub column: String,
    /// Distinct keys with a value.
    pub countries_with_data: usize,
    pub mean: Option<f64>,
    /// Highest values, best first.
    pub top: Vec<(String, f64)>,
}

/// Paired non-null columns, or `None` when no line can be fitted.
struct Paired {
    x: Float64Chunked,
    y: Float64Chunked,
}

fn paired(pairs: &[(f64, f64)]) -> Option<Paired> {
    let (first_x, first_y) = *pairs.first()?;
    if pairs.len() < 2 {
        return None;
    }
    let flat_x = pairs.iter().all(|(x, _)| *x == first_x);
    let flat_y = pairs.iter().all(|(_, y)| *y == first_y);
    if flat_x || flat_y {
        return None;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    Some(Paired {
        x: Float64Chunked::from_vec("x".into(), xs),
        y: Float64Chunked::from_vec("y".into(), ys),
    })
}

/// Pearson correlation coefficient.
///
/// `None` with fewer than two pairs or when either side has no variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let Paired { x, y } = paired(pairs)?;
    pearson_corr(&x, &y)
}

/// Ordinary least squares fit of y on x.
pub fn ols(pairs: &[(f64, f64)]) -> Option<Trendline> {
    let Paired { x, y } = paired(pairs)?;
    let slope = cov(&x, &y, 1)? / x.var(1)?;
    let r = pearson_corr(&x, &y)?;
    Some(Trendline {
        slope,
        intercept: y.mean()? - slope * x.mean()?,
        r_squared: r * r,
    })
}

fn summarize(group: &str, pairs: &[(f64, f64)]) -> CorrelationSummary {
    let summary = CorrelationSummary {
        group: group.to_string(),
        pairs: pairs.len(),
        pearson_r: pearson(pairs),
        trendline: ols(pairs),
    };
    if summary.pearson_r.is_none() {
        tracing::debug!(group, pairs = pairs.len(), "not enough variation for a correlation");
    }
    summary
}

fn numeric(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(column)
        .map_err(|_| TransformError::ColumnNotFound {
            table: "global".to_string(),
            column: column.to_string(),
        })?;
    Ok(column_f64_values(column))
}

fn text(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(column)
        .map_err(|_| TransformError::ColumnNotFound {
            table: "global".to_string(),
            column: column.to_string(),
        })?;
    Ok(column_text_values(column))
}

/// Correlates `x` with `y` over all rows, then per group of `group_column`.
///
/// Rows missing either value are skipped. The first summary is the all-rows
/// group; the rest follow `groups` order.
pub fn correlate(
    df: &DataFrame,
    x: &str,
    y: &str,
    group_column: Option<&str>,
    groups: &[&str],
) -> Result<Vec<CorrelationSummary>> {
    let xs = numeric(df, x)?;
    let ys = numeric(df, y)?;
    let labels = match group_column {
        Some(column) => Some(text(df, column)?),
        None => None,
    };

    let pairs_where = |keep: &dyn Fn(usize) -> bool| -> Vec<(f64, f64)> {
        xs.iter()
            .zip(&ys)
            .enumerate()
            .filter(|(row, _)| keep(*row))
            .filter_map(|(_, (x, y))| Some(((*x)?, (*y)?)))
            .collect()
    };

    let mut summaries = vec![summarize(ALL_GROUPS, &pairs_where(&|_| true))];
    if let Some(labels) = &labels {
        for group in groups {
            let pairs = pairs_where(&|row| labels[row].as_deref() == Some(*group));
            summaries.push(summarize(group, &pairs));
        }
    }

    tracing::info!(x, y, groups = summaries.len(), "computed correlations");
    Ok(summaries)
}

/// Mean, coverage and top values of one indicator.
pub fn indicator_summary(
    df: &DataFrame,
    column: &str,
    key: &str,
    top: usize,
) -> Result<IndicatorSummary> {
    let values = numeric(df, column)?;
    let keys = text(df, key)?;

    let mut present: Vec<(String, f64)> = keys
        .into_iter()
        .zip(values)
        .filter_map(|(key, value)| Some((key?, value?)))
        .collect();
    let countries: BTreeSet<&str> = present.iter().map(|(key, _)| key.as_str()).collect();
    let countries_with_data = countries.len();
    let mean = (!present.is_empty())
        .then(|| present.iter().map(|(_, value)| value).sum::<f64>() / present.len() as f64);

    present.sort_by(|a, b| b.1.total_cmp(&a.1));
    present.truncate(top);

    Ok(IndicatorSummary {
        column: column.to_string(),
        countries_with_data,
        mean,
        top: present,
    })
}
