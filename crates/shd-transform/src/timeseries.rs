//! Country-by-year pivot of yearly snapshot tables.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use shd_common::{column_f64_values, column_text_values};

use crate::error::{Result, TransformError};

/// One year's canonical snapshot frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Year digits, used as the output column name.
    pub year: String,
    pub frame: DataFrame,
}

impl Snapshot {
    pub fn new(year: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            year: year.into(),
            frame,
        }
    }
}

/// Numeric sort key for year digits; leading zeros are ignored.
fn year_order(year: &str) -> (usize, &str) {
    let digits = year.trim_start_matches('0');
    (digits.len(), digits)
}

/// Pivots long `(key, value)` snapshots into one wide table.
///
/// Rows are every country seen in any snapshot, sorted by name. Columns are
/// `key` followed by one `Float64` column per year, ascending. A country
/// absent from a year is null in that year's column. Snapshots may arrive in
/// any order and years need not be contiguous.
pub fn build_time_series(snapshots: &[Snapshot], key: &str, value: &str) -> Result<DataFrame> {
    let _span = tracing::info_span!("timeseries", snapshots = snapshots.len()).entered();

    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| year_order(&a.year).cmp(&year_order(&b.year)));
    let mut seen = BTreeSet::new();
    for snapshot in &ordered {
        if !seen.insert(year_order(&snapshot.year)) {
            return Err(TransformError::DuplicateYear {
                year: snapshot.year.clone(),
            });
        }
    }

    // country -> one slot per year, in `ordered` order.
    let mut matrix: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for (slot, snapshot) in ordered.iter().enumerate() {
        let table = format!("snapshot {}", snapshot.year);
        let keys = snapshot
            .frame
            .column(key)
            .map_err(|_| TransformError::ColumnNotFound {
                table: table.clone(),
                column: key.to_string(),
            })?;
        let scores = snapshot
            .frame
            .column(value)
            .map_err(|_| TransformError::ColumnNotFound {
                table: table.clone(),
                column: value.to_string(),
            })?;

        let mut in_file = BTreeSet::new();
        let mut null_keys = 0usize;
        for (country, score) in column_text_values(keys)
            .into_iter()
            .zip(column_f64_values(scores))
        {
            let Some(country) = country else {
                null_keys += 1;
                continue;
            };
            if !in_file.insert(country.clone()) {
                tracing::warn!(
                    year = %snapshot.year,
                    country = %country,
                    "country repeated in snapshot, keeping the last value"
                );
            }
            let row = matrix
                .entry(country)
                .or_insert_with(|| vec![None; ordered.len()]);
            row[slot] = score;
        }
        if null_keys > 0 {
            tracing::warn!(year = %snapshot.year, rows = null_keys, "skipped rows without a country");
        }
        tracing::debug!(year = %snapshot.year, countries = in_file.len(), "added snapshot");
    }

    let countries: Vec<&str> = matrix.keys().map(String::as_str).collect();
    let mut columns = Vec::with_capacity(ordered.len() + 1);
    columns.push(Column::new(key.into(), countries));
    for (slot, snapshot) in ordered.iter().enumerate() {
        let values: Vec<Option<f64>> = matrix.values().map(|row| row[slot]).collect();
        columns.push(Column::new(snapshot.year.as_str().into(), values));
    }
    let df = DataFrame::new(columns)?;

    tracing::info!(
        countries = df.height(),
        years = ordered.len(),
        "built time series"
    );
    Ok(df)
}
