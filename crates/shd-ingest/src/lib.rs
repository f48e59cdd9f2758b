//! Source data ingestion.
//!
//! Reads the public CSV datasets as raw text tables (no type inference) and
//! finds the yearly happiness snapshot files.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use shd_ingest::{ReadOptions, SourceEncoding, discover_snapshots, read_raw_table};
//!
//! let gef = read_raw_table(
//!     Path::new("data/GEF_2023.csv"),
//!     &ReadOptions::default().with_encoding(SourceEncoding::Latin1),
//! )?;
//! let snapshots = discover_snapshots(Path::new("data/timeseries"))?;
//! ```

mod discovery;
mod error;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use source::{
    DEFAULT_NA_TOKENS, RawTable, ReadOptions, SourceEncoding, is_na_token, read_raw_table,
};

// === File Discovery ===
pub use discovery::{SnapshotFile, discover_snapshots, extract_year, list_csv_files};
