//! Error types for artifact writing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O failure on a file or directory.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming the finished temp file into place failed.
    #[error("failed to move {temp_path} to {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("failed to write JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("output path is a directory: {path}")]
    TargetIsDirectory { path: PathBuf },

    /// Target has no file name to derive a temp name from.
    #[error("output path has no file name: {path}")]
    InvalidPath { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, OutputError>;
