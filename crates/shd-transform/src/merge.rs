//! Sequential left joins on the country key.
//!
//! The base table fixes the row set: every join looks each base key up in
//! the joined table and copies that row's columns across, or nulls when the
//! key is absent. Keys match byte for byte. A joined table may not repeat a
//! key, so a join can never add rows.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;
use serde::Serialize;
use shd_common::{column_names, column_text_values};
use shd_model::OverlapPolicy;

use crate::error::{Result, TransformError};
use crate::normalize::{next_free_name, normalize_column_name};

/// A canonical frame and the label used in messages and suffixes.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub label: String,
    pub frame: DataFrame,
}

impl SourceFrame {
    pub fn new(label: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            label: label.into(),
            frame,
        }
    }
}

/// How an incoming column that already existed was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapResolution {
    pub column: String,
    /// Name the incoming column ended up with, `None` when dropped.
    pub kept_as: Option<String>,
}

/// One join step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinStep {
    pub table: String,
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows of the joined table.
    pub joined_rows: usize,
    /// Base rows whose key was found.
    pub matched: usize,
    /// Base rows whose key was null or absent.
    pub unmatched: usize,
    pub added_columns: Vec<String>,
    pub overlaps: Vec<OverlapResolution>,
}

/// All join steps of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub key: String,
    pub base: String,
    pub base_rows: usize,
    pub steps: Vec<JoinStep>,
}

fn key_column<'a>(source: &'a SourceFrame, key: &str) -> Result<&'a Column> {
    source
        .frame
        .column(key)
        .map_err(|_| TransformError::ColumnNotFound {
            table: source.label.clone(),
            column: key.to_string(),
        })
}

/// Row index of each non-null key, rejecting repeated keys.
fn index_keys(source: &SourceFrame, key: &str) -> Result<HashMap<String, IdxSize>> {
    let values = column_text_values(key_column(source, key)?);
    let mut index = HashMap::with_capacity(values.len());
    let mut duplicates = BTreeSet::new();
    for (row, value) in values.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        if index.contains_key(&value) {
            duplicates.insert(value);
        } else {
            index.insert(value, row as IdxSize);
        }
    }
    if !duplicates.is_empty() {
        return Err(TransformError::DuplicateJoinKey {
            table: source.label.clone(),
            key: key.to_string(),
            values: duplicates.into_iter().collect(),
        });
    }
    Ok(index)
}

/// Left-joins `joins` onto `base` in order.
///
/// Output rows are the base rows in base order. Incoming columns whose name
/// the merged table already has are resolved by `overlap`.
pub fn merge_left(
    base: &SourceFrame,
    joins: &[SourceFrame],
    key: &str,
    overlap: OverlapPolicy,
) -> Result<(DataFrame, MergeReport)> {
    let _span = tracing::info_span!("merge", base = %base.label, key).entered();
    key_column(base, key)?;

    let mut merged = base.frame.clone();
    let mut report = MergeReport {
        key: key.to_string(),
        base: base.label.clone(),
        base_rows: merged.height(),
        steps: Vec::with_capacity(joins.len()),
    };

    for join in joins {
        let (next, step) = join_one(&merged, join, key, overlap)?;
        tracing::info!(
            table = %step.table,
            rows_before = step.rows_before,
            rows_after = step.rows_after,
            matched = step.matched,
            unmatched = step.unmatched,
            added = step.added_columns.len(),
            "join complete"
        );
        merged = next;
        report.steps.push(step);
    }

    Ok((merged, report))
}

fn join_one(
    merged: &DataFrame,
    join: &SourceFrame,
    key: &str,
    overlap: OverlapPolicy,
) -> Result<(DataFrame, JoinStep)> {
    let index = index_keys(join, key)?;
    let base_keys = column_text_values(merged.column(key)?);
    let positions: Vec<Option<IdxSize>> = base_keys
        .iter()
        .map(|value| value.as_ref().and_then(|value| index.get(value).copied()))
        .collect();
    let matched = positions.iter().filter(|position| position.is_some()).count();

    let indices = IdxCa::from_iter_options("idx".into(), positions.into_iter());
    let gathered = join.frame.take(&indices)?;

    let mut columns: Vec<Column> = merged.get_columns().to_vec();
    let mut taken: BTreeSet<String> = column_names(merged).into_iter().collect();
    let mut step = JoinStep {
        table: join.label.clone(),
        rows_before: merged.height(),
        rows_after: 0,
        joined_rows: join.frame.height(),
        matched,
        unmatched: merged.height() - matched,
        added_columns: Vec::new(),
        overlaps: Vec::new(),
    };

    for column in gathered.get_columns() {
        let name = column.name().to_string();
        if name == key {
            continue;
        }
        if !taken.contains(&name) {
            taken.insert(name.clone());
            step.added_columns.push(name);
            columns.push(column.clone());
            continue;
        }

        match overlap {
            OverlapPolicy::Error => {
                return Err(TransformError::ColumnOverlap {
                    table: join.label.clone(),
                    column: name,
                });
            }
            OverlapPolicy::KeepLeft => {
                tracing::warn!(table = %join.label, column = %name, "keeping existing column");
                step.overlaps.push(OverlapResolution {
                    column: name,
                    kept_as: None,
                });
            }
            OverlapPolicy::KeepRight => {
                tracing::warn!(table = %join.label, column = %name, "replacing existing column");
                if let Some(slot) = columns.iter_mut().find(|c| c.name().as_str() == name) {
                    *slot = column.clone();
                }
                step.overlaps.push(OverlapResolution {
                    column: name.clone(),
                    kept_as: Some(name),
                });
            }
            OverlapPolicy::Suffix => {
                let renamed = suffixed_name(&name, &join.label, &taken);
                tracing::warn!(
                    table = %join.label,
                    column = %name,
                    renamed = %renamed,
                    "column already present, suffixing"
                );
                taken.insert(renamed.clone());
                columns.push(column.clone().with_name(renamed.as_str().into()));
                step.added_columns.push(renamed.clone());
                step.overlaps.push(OverlapResolution {
                    column: name,
                    kept_as: Some(renamed),
                });
            }
            OverlapPolicy::SuffixXy => {
                taken.remove(&name);
                let left = free_name(&format!("{name}_x"), &taken);
                taken.insert(left.clone());
                let right = free_name(&format!("{name}_y"), &taken);
                taken.insert(right.clone());
                tracing::warn!(
                    table = %join.label,
                    column = %name,
                    left = %left,
                    right = %right,
                    "column already present, suffixing both"
                );
                if let Some(slot) = columns.iter_mut().find(|c| c.name().as_str() == name) {
                    slot.rename(left.as_str().into());
                }
                columns.push(column.clone().with_name(right.as_str().into()));
                step.added_columns.push(right.clone());
                step.overlaps.push(OverlapResolution {
                    column: name,
                    kept_as: Some(right),
                });
            }
        }
    }

    let next = DataFrame::new(columns)?;
    if next.height() != merged.height() {
        return Err(TransformError::RowCountDrift {
            table: join.label.clone(),
            before: merged.height(),
            after: next.height(),
        });
    }
    step.rows_after = next.height();
    Ok((next, step))
}

/// `<column>_<label>`, deduplicated with `_2`, `_3`, ... when taken.
fn suffixed_name(column: &str, label: &str, taken: &BTreeSet<String>) -> String {
    let label = normalize_column_name(label);
    let label = if label.is_empty() { "right" } else { &label };
    free_name(&format!("{column}_{label}"), taken)
}

fn free_name(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut counter = 2;
    next_free_name(base, &mut counter, taken)
}
