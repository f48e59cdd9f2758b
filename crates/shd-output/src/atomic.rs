//! Temp-file-then-rename writes.
//!
//! Consumers look for the final file name, so it must only ever appear
//! complete. Content goes to a hidden sibling temp file, is synced, and is
//! then renamed over the target.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{OutputError, Result};

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| OutputError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    Ok(path.with_file_name(format!(".{name}.tmp")))
}

/// A finished temp file waiting to be renamed over its target.
///
/// Dropping it without [`StagedFile::commit`] removes the temp file.
#[derive(Debug)]
#[must_use = "a staged file is discarded unless committed"]
pub struct StagedFile {
    temp_path: PathBuf,
    target_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target_path
    }

    /// Renames the temp file over the target.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp_path, &self.target_path).map_err(|e| {
            OutputError::AtomicWriteFailed {
                temp_path: self.temp_path.clone(),
                target_path: self.target_path.clone(),
                source: e,
            }
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            remove_temp(&self.temp_path);
        }
    }
}

fn remove_temp(temp_path: &Path) {
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %e, "could not remove temp file");
        }
    }
}

/// Writes the content for `path` to its temp sibling without touching `path`.
pub fn stage_atomic<F>(path: &Path, write: F) -> Result<StagedFile>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp_path = temp_path_for(path)?;
    if path.is_dir() {
        return Err(OutputError::TargetIsDirectory {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    if let Err(e) = write_temp(&temp_path, write) {
        remove_temp(&temp_path);
        return Err(e);
    }
    Ok(StagedFile {
        temp_path,
        target_path: path.to_path_buf(),
        committed: false,
    })
}

/// Writes `path` through `write`, atomically.
///
/// On any failure the temp file is removed and the target is untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    stage_atomic(path, write)?.commit()
}

/// Commits staged files in order.
///
/// Call only once every file of a run is staged. On a failed rename the
/// remaining temp files are removed.
pub fn commit_all(staged: Vec<StagedFile>) -> Result<()> {
    for file in staged {
        file.commit()?;
    }
    Ok(())
}

fn write_temp<F>(temp_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(temp_path).map_err(|e| OutputError::Io {
        operation: "create",
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(|e| OutputError::Io {
        operation: "write",
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    writer.get_ref().sync_all().map_err(|e| OutputError::Io {
        operation: "sync",
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
