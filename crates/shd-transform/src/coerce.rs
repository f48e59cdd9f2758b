//! Declared-type coercion.
//!
//! Every cell either converts to its column's declared type or becomes null.
//! Nothing here fails on bad data; failures are collected into a
//! [`CoercionReport`] so they can be audited after the run.

use polars::prelude::*;
use shd_common::column_text_values;
use shd_ingest::is_na_token;
use shd_model::{CoercionReport, ColumnCoercion, ColumnSpec, ColumnType, ParseFailure, TableSchema};

use crate::error::{Result, TransformError};

/// Currency decoration removed before parsing.
const CURRENCY_SYMBOLS: &[char] = &['$', ',', '€', '£', '¥'];

/// A successfully converted cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

/// Parses a float. NaN counts as missing.
pub fn coerce_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Parses a currency string such as `"$12,345"` as a float.
pub fn coerce_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !CURRENCY_SYMBOLS.contains(ch) && !ch.is_whitespace())
        .collect();
    coerce_float(&cleaned)
}

/// Parses a whole number. Float text with no fractional part (`"2020.0"`) is
/// accepted.
pub fn coerce_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = coerce_float(trimmed)?;
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Converts one cell to `column_type`, `None` when it does not parse.
///
/// ```
/// use shd_model::ColumnType;
/// use shd_transform::{CoercedValue, coerce_value};
///
/// assert_eq!(coerce_value("$12,345", ColumnType::Currency), Some(CoercedValue::Float(12345.0)));
/// assert_eq!(coerce_value("N/A", ColumnType::Currency), None);
/// assert_eq!(coerce_value("7.5", ColumnType::Float), Some(CoercedValue::Float(7.5)));
/// ```
pub fn coerce_value(raw: &str, column_type: ColumnType) -> Option<CoercedValue> {
    match column_type {
        ColumnType::Float => coerce_float(raw).map(CoercedValue::Float),
        ColumnType::Currency => coerce_currency(raw).map(CoercedValue::Float),
        ColumnType::Integer => coerce_integer(raw).map(CoercedValue::Integer),
        ColumnType::Text => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| CoercedValue::Text(trimmed.to_string()))
        }
    }
}

/// Converts every column `schema` declares.
///
/// Undeclared columns pass through untouched. A declared column missing from
/// the frame is an error unless it is marked optional.
pub fn coerce_columns(df: &DataFrame, schema: &TableSchema) -> Result<(DataFrame, CoercionReport)> {
    let _span = tracing::info_span!("coerce", schema = %schema.name).entered();
    let mut out = df.clone();
    let mut report = CoercionReport::default();

    for spec in &schema.columns {
        let Ok(column) = df.column(&spec.name) else {
            if spec.optional {
                tracing::debug!(column = %spec.name, "optional column absent");
                report.skipped.push(spec.name.clone());
                continue;
            }
            return Err(TransformError::ColumnNotFound {
                table: schema.name.clone(),
                column: spec.name.clone(),
            });
        };

        let (converted, audit) = coerce_column(column, spec);
        if audit.failed() > 0 {
            tracing::warn!(
                column = %audit.column,
                column_type = %audit.column_type,
                failed = audit.failed(),
                values = ?audit.distinct_failures(),
                "values failed to parse and were set to missing"
            );
        }
        tracing::debug!(
            column = %audit.column,
            converted = audit.converted,
            missing = audit.missing_after(),
            "coerced column"
        );
        out.with_column(converted)?;
        report.columns.push(audit);
    }

    Ok((out, report))
}

fn coerce_column(column: &Column, spec: &ColumnSpec) -> (Column, ColumnCoercion) {
    let mut audit = ColumnCoercion::new(spec.name.clone(), spec.column_type);
    let cells = column_text_values(column);
    audit.total = cells.len();

    let mut values: Vec<Option<CoercedValue>> = Vec::with_capacity(cells.len());
    for (row, cell) in cells.into_iter().enumerate() {
        let Some(raw) = cell.filter(|raw| !is_missing_text(raw)) else {
            audit.missing_before += 1;
            values.push(None);
            continue;
        };
        match coerce_value(&raw, spec.column_type) {
            Some(value) => {
                audit.converted += 1;
                values.push(Some(value));
            }
            None => {
                audit.failures.push(ParseFailure { row, value: raw });
                values.push(None);
            }
        }
    }

    let name: PlSmallStr = spec.name.as_str().into();
    let column = match spec.column_type {
        ColumnType::Float | ColumnType::Currency => {
            let floats: Vec<Option<f64>> = values
                .into_iter()
                .map(|value| match value {
                    Some(CoercedValue::Float(v)) => Some(v),
                    _ => None,
                })
                .collect();
            Column::new(name, floats)
        }
        ColumnType::Integer => {
            let ints: Vec<Option<i64>> = values
                .into_iter()
                .map(|value| match value {
                    Some(CoercedValue::Integer(v)) => Some(v),
                    _ => None,
                })
                .collect();
            Column::new(name, ints)
        }
        ColumnType::Text => {
            let texts: Vec<Option<String>> = values
                .into_iter()
                .map(|value| match value {
                    Some(CoercedValue::Text(v)) => Some(v),
                    _ => None,
                })
                .collect();
            Column::new(name, texts)
        }
    };
    (column, audit)
}

fn is_missing_text(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || is_na_token(trimmed)
}
