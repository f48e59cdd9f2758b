//! Column name normalization.
//!
//! Raw headers such as `" Per Capita GDP! "` become canonical
//! `[a-z0-9_]` identifiers (`per_capita_gdp`). Column order and cell data are
//! never changed; only names are rewritten. When two headers land on the same
//! canonical name the [`CollisionPolicy`] decides what survives.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;
use serde::Serialize;
use shd_common::column_names;
use shd_ingest::RawTable;
use shd_model::{CollisionPolicy, MappingTable};

use crate::error::{Result, TransformError};

/// A header whose name changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// Headers that normalized to the same name and how they were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCollision {
    pub canonical: String,
    /// Raw headers in table order.
    pub sources: Vec<String>,
    /// Output names of the columns that were kept.
    pub kept: Vec<String>,
}

/// What normalization did to one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub table: String,
    pub renamed: Vec<ColumnRename>,
    pub collisions: Vec<ColumnCollision>,
    /// Raw headers dropped by `first_wins` or `last_wins`.
    pub dropped: Vec<String>,
}

/// Normalizes one header.
///
/// Trim, lowercase, turn each whitespace character into `_`, then drop every
/// character outside `[a-z0-9_]`. Applying it twice gives the same result as
/// applying it once.
///
/// ```
/// use shd_transform::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Per Capita GDP! "), "per_capita_gdp");
/// assert_eq!(normalize_column_name("per_capita_gdp"), "per_capita_gdp");
/// ```
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter_map(|ch| {
            if ch.is_whitespace() {
                Some('_')
            } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
                Some(ch)
            } else {
                None
            }
        })
        .collect()
}

/// Output columns as (source position, output name), in output order.
struct ColumnPlan {
    columns: Vec<(usize, String)>,
    report: NormalizationReport,
}

fn plan_columns(table: &str, headers: &[String], policy: CollisionPolicy) -> Result<ColumnPlan> {
    let mut canonical = Vec::with_capacity(headers.len());
    for raw in headers {
        let name = normalize_column_name(raw);
        if name.is_empty() {
            return Err(TransformError::EmptyColumnName {
                table: table.to_string(),
                raw: raw.clone(),
            });
        }
        canonical.push(name);
    }

    // Positions sharing each canonical name, groups in first-seen order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in canonical.iter().enumerate() {
        match group_of.get(name.as_str()) {
            Some(&group) => groups[group].1.push(idx),
            None => {
                group_of.insert(name.as_str(), groups.len());
                groups.push((name.clone(), vec![idx]));
            }
        }
    }

    let mut report = NormalizationReport {
        table: table.to_string(),
        ..NormalizationReport::default()
    };

    if policy == CollisionPolicy::Error
        && let Some((name, positions)) = groups.iter().find(|(_, positions)| positions.len() > 1)
    {
        return Err(TransformError::ColumnCollision {
            table: table.to_string(),
            canonical: name.clone(),
            sources: positions.iter().map(|&idx| headers[idx].clone()).collect(),
        });
    }

    let mut columns: Vec<(usize, String)> = Vec::with_capacity(headers.len());
    match policy {
        CollisionPolicy::Error | CollisionPolicy::FirstWins | CollisionPolicy::LastWins => {
            for (name, positions) in &groups {
                let kept = if policy == CollisionPolicy::LastWins {
                    positions[positions.len() - 1]
                } else {
                    positions[0]
                };
                columns.push((kept, name.clone()));
                if positions.len() > 1 {
                    for &idx in positions.iter().filter(|&&idx| idx != kept) {
                        report.dropped.push(headers[idx].clone());
                    }
                    report.collisions.push(ColumnCollision {
                        canonical: name.clone(),
                        sources: positions.iter().map(|&idx| headers[idx].clone()).collect(),
                        kept: vec![name.clone()],
                    });
                }
            }
        }
        CollisionPolicy::Suffix => {
            let mut taken: BTreeSet<String> = canonical.iter().cloned().collect();
            let mut output_names = vec![String::new(); headers.len()];
            for (name, positions) in &groups {
                output_names[positions[0]] = name.clone();
                let mut counter = 2usize;
                for &idx in &positions[1..] {
                    let suffixed = next_free_name(name, &mut counter, &taken);
                    taken.insert(suffixed.clone());
                    output_names[idx] = suffixed;
                }
                if positions.len() > 1 {
                    report.collisions.push(ColumnCollision {
                        canonical: name.clone(),
                        sources: positions.iter().map(|&idx| headers[idx].clone()).collect(),
                        kept: positions.iter().map(|&idx| output_names[idx].clone()).collect(),
                    });
                }
            }
            columns.extend(output_names.into_iter().enumerate());
        }
    }

    for collision in &report.collisions {
        tracing::warn!(
            table,
            canonical = %collision.canonical,
            sources = ?collision.sources,
            kept = ?collision.kept,
            policy = ?policy,
            "column names collide after normalization"
        );
    }
    for (idx, name) in &columns {
        if headers[*idx] != *name {
            report.renamed.push(ColumnRename {
                from: headers[*idx].clone(),
                to: name.clone(),
            });
        }
    }

    Ok(ColumnPlan { columns, report })
}

/// Returns `<base>_<n>` for the first `n >= counter` not in `taken`.
pub(crate) fn next_free_name(base: &str, counter: &mut usize, taken: &BTreeSet<String>) -> String {
    loop {
        let candidate = format!("{base}_{counter}");
        *counter += 1;
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

/// Builds a canonical text frame from a raw table.
///
/// Every column is `String`; missing cells are null.
pub fn normalize_table(
    raw: &RawTable,
    policy: CollisionPolicy,
) -> Result<(DataFrame, NormalizationReport)> {
    let table = raw.source_label();
    let plan = plan_columns(&table, raw.headers(), policy)?;
    let columns: Vec<Column> = plan
        .columns
        .iter()
        .map(|(idx, name)| Column::new(name.as_str().into(), raw.column(*idx)))
        .collect();
    let df = DataFrame::new(columns)?;
    tracing::debug!(
        table = %table,
        columns = df.width(),
        rows = df.height(),
        renamed = plan.report.renamed.len(),
        "normalized column names"
    );
    Ok((df, plan.report))
}

/// Normalizes the column names of an existing frame.
pub fn normalize_columns(
    df: &DataFrame,
    table: &str,
    policy: CollisionPolicy,
) -> Result<(DataFrame, NormalizationReport)> {
    let plan = plan_columns(table, &column_names(df), policy)?;
    let source = df.get_columns();
    let columns: Vec<Column> = plan
        .columns
        .iter()
        .map(|(idx, name)| source[*idx].clone().with_name(name.as_str().into()))
        .collect();
    Ok((DataFrame::new(columns)?, plan.report))
}

/// Applies a column rename table to canonical names.
///
/// A rename whose target already exists in the frame is an error, so a
/// rename can never silently replace data.
pub fn apply_column_renames(
    df: &DataFrame,
    table: &str,
    renames: &MappingTable,
) -> Result<(DataFrame, Vec<ColumnRename>)> {
    let names = column_names(df);
    let mut present: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let mut applied = Vec::new();
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().as_str();
        match renames.get(name) {
            Some(target) => {
                if present.contains(target) {
                    return Err(TransformError::RenameConflict {
                        table: table.to_string(),
                        from: name.to_string(),
                        to: target.to_string(),
                    });
                }
                present.insert(target);
                applied.push(ColumnRename {
                    from: name.to_string(),
                    to: target.to_string(),
                });
                columns.push(column.clone().with_name(target.into()));
            }
            None => columns.push(column.clone()),
        }
    }

    for rename in &applied {
        tracing::info!(table, from = %rename.from, to = %rename.to, "renamed column");
    }
    Ok((DataFrame::new(columns)?, applied))
}
