//! Job stages shared by the commands.
//!
//! Every job follows the same order:
//! 1. **Ingest**: read every source file as raw text
//! 2. **Canonicalize**: normalize headers, apply the column rename table
//! 3. **Transform**: merge, pivot or filter, then coerce declared types
//! 4. **Output**: write all artifacts, only after every input was read
//!
//! A job that fails in stages 1 to 3 writes nothing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use shd_common::column_names;
use shd_ingest::{RawTable, ReadOptions, read_raw_table};
use shd_model::{CoercionReport, CollisionPolicy, MappingTable};
use shd_output::{commit_all, stage_csv, stage_json};
use shd_transform::{
    ColumnRename, CorrelationSummary, NormalizationReport, apply_column_renames, normalize_table,
};

use crate::types::OutputSummary;

// ============================================================================
// Stage 1: Ingest
// ============================================================================

/// Reads one source file.
pub fn ingest(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let raw = read_raw_table(path, options).with_context(|| format!("read {}", path.display()))?;
    info!(
        rows = raw.height(),
        columns = raw.width(),
        encoding = %options.encoding,
        "loaded source"
    );
    Ok(raw)
}

// ============================================================================
// Stage 2: Canonicalize
// ============================================================================

/// A source with canonical column names.
#[derive(Debug)]
pub struct CanonicalTable {
    pub label: String,
    pub frame: DataFrame,
    pub normalization: NormalizationReport,
    pub renames: Vec<ColumnRename>,
}

/// Normalizes headers, then applies the column rename table.
pub fn canonicalize(
    raw: &RawTable,
    label: &str,
    policy: CollisionPolicy,
    renames: &MappingTable,
) -> Result<CanonicalTable> {
    let (normalized, normalization) =
        normalize_table(raw, policy).with_context(|| format!("normalize {label} columns"))?;
    let (frame, applied) = apply_column_renames(&normalized, label, renames)
        .with_context(|| format!("rename {label} columns"))?;
    Ok(CanonicalTable {
        label: label.to_string(),
        frame,
        normalization,
        renames: applied,
    })
}

/// Logs name, dtype and non-null count of every column.
pub fn log_inventory(stage: &str, df: &DataFrame) {
    info!(stage, rows = df.height(), columns = df.width(), "column inventory");
    for column in df.get_columns() {
        debug!(
            stage,
            column = %column.name(),
            dtype = %column.dtype(),
            non_null = column.len() - column.null_count(),
            "column"
        );
    }
}

/// Reads an already cleaned dataset back as canonical text columns.
pub fn read_cleaned(path: &Path, policy: CollisionPolicy) -> Result<DataFrame> {
    let raw = ingest(path, &ReadOptions::default())?;
    let (frame, _) = normalize_table(&raw, policy)
        .with_context(|| format!("normalize {} columns", path.display()))?;
    debug!(columns = ?column_names(&frame), "read cleaned dataset");
    Ok(frame)
}

// ============================================================================
// Stage 4: Output
// ============================================================================

/// A file to write at the end of a job.
#[derive(Debug)]
pub enum Artifact {
    Table {
        path: PathBuf,
        frame: DataFrame,
    },
    Coercion {
        path: PathBuf,
        report: CoercionReport,
    },
    Correlations {
        path: PathBuf,
        summaries: Vec<CorrelationSummary>,
    },
}

impl Artifact {
    fn path(&self) -> &Path {
        match self {
            Artifact::Table { path, .. }
            | Artifact::Coercion { path, .. }
            | Artifact::Correlations { path, .. } => path,
        }
    }

    fn shape(&self) -> Option<(usize, usize)> {
        match self {
            Artifact::Table { frame, .. } => Some((frame.height(), frame.width())),
            Artifact::Coercion { .. } | Artifact::Correlations { .. } => None,
        }
    }
}

/// Writes every artifact, or only lists them when `dry_run` is set.
///
/// All artifacts are staged before any is renamed into place, so a failure
/// on one leaves the previous outputs of the whole job untouched.
pub fn write_artifacts(artifacts: &[Artifact], dry_run: bool) -> Result<Vec<OutputSummary>> {
    let span = info_span!("output", artifacts = artifacts.len(), dry_run);
    let _guard = span.enter();
    let outputs: Vec<OutputSummary> = artifacts
        .iter()
        .map(|artifact| OutputSummary {
            path: artifact.path().to_path_buf(),
            shape: artifact.shape(),
            written: !dry_run,
        })
        .collect();
    if dry_run {
        for output in &outputs {
            info!(path = %output.path.display(), "dry run, not writing");
        }
        return Ok(outputs);
    }

    let mut staged = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = artifact.path();
        let file = match artifact {
            Artifact::Table { frame, .. } => stage_csv(frame, path),
            Artifact::Coercion { report, .. } => stage_json(report, path),
            Artifact::Correlations { summaries, .. } => stage_json(summaries, path),
        }
        .with_context(|| format!("write {}", path.display()))?;
        staged.push(file);
    }
    commit_all(staged).context("move outputs into place")?;
    for output in &outputs {
        info!(path = %output.path.display(), "wrote output");
    }
    Ok(outputs)
}
