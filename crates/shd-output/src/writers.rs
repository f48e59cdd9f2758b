//! CSV and JSON artifacts.

use std::path::Path;

use polars::prelude::*;
use serde::Serialize;

use crate::atomic::{StagedFile, stage_atomic};
use crate::error::{OutputError, Result};

/// Stages `df` as a headed, comma-separated CSV. Nulls are empty cells.
pub fn stage_csv(df: &DataFrame, path: &Path) -> Result<StagedFile> {
    let mut df = df.clone();
    let staged = stage_atomic(path, |writer| {
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut df)
            .map_err(|source| OutputError::Csv {
                path: path.to_path_buf(),
                source,
            })
    })?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "staged CSV"
    );
    Ok(staged)
}

/// Stages `value` as pretty-printed JSON.
pub fn stage_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<StagedFile> {
    stage_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, value).map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Writes `df` as CSV in place of `path`.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    stage_csv(df, path)?.commit()?;
    tracing::info!(path = %path.display(), "wrote CSV");
    Ok(())
}

/// Writes `value` as pretty-printed JSON in place of `path`.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    stage_json(value, path)?.commit()?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}
