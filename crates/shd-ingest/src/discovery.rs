//! File discovery for yearly snapshot directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// A snapshot file and the year its name encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Year digits taken from the file name (e.g. "2020").
    pub year: String,
    /// Path to the CSV file.
    pub path: PathBuf,
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Check for .csv extension (case-insensitive)
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Extracts the year from a snapshot file name.
///
/// Only the name up to its first `.` counts. Every ASCII digit of that part
/// is kept, in order, so `whr_2020.csv` and `2020.v2.csv` both give `2020`.
pub fn extract_year(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    let head = name.split('.').next().unwrap_or("");
    let year: String = head.chars().filter(char::is_ascii_digit).collect();
    if year.is_empty() {
        return Err(IngestError::InvalidSnapshotName {
            path: path.to_path_buf(),
        });
    }
    Ok(year)
}

/// Finds the yearly snapshot files in `dir`, sorted by year ascending.
///
/// Years compare numerically, so `999` sorts before `2018`.
pub fn discover_snapshots(dir: &Path) -> Result<Vec<SnapshotFile>> {
    let files = list_csv_files(dir)?;
    let mut by_year: BTreeMap<(usize, String), SnapshotFile> = BTreeMap::new();

    for path in files {
        let year = extract_year(&path)?;
        let normalized = year.trim_start_matches('0').to_string();
        let key = (normalized.len(), normalized);
        if let Some(first) = by_year.get(&key) {
            return Err(IngestError::DuplicateYear {
                year,
                first: first.path.clone(),
                second: path,
            });
        }
        by_year.insert(key, SnapshotFile { year, path });
    }

    let snapshots: Vec<SnapshotFile> = by_year.into_values().collect();

    tracing::debug!(
        dir = %dir.display(),
        count = snapshots.len(),
        "discovered snapshot files"
    );
    Ok(snapshots)
}
