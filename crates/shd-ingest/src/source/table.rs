//! Raw text table as read from a source file.

use std::path::{Path, PathBuf};

/// Header row plus text cells, exactly as read.
///
/// Cells are `None` when empty or an NA token. Every row has exactly
/// `headers.len()` cells. Header names are kept verbatim (apart from a
/// stripped byte order mark) so the normalizer sees what the source holds,
/// duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Builds a table, padding short rows with `None`.
    ///
    /// Rows longer than the header are truncated; the CSV reader rejects them
    /// before they get here.
    pub fn new(
        source: impl Into<PathBuf>,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// File the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Short label for the source, the file stem when there is one.
    pub fn source_label(&self) -> String {
        self.source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map_or_else(|| self.source.display().to_string(), str::to_string)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Cells of column `index` in row order.
    pub fn column(&self, index: usize) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().flatten())
            .collect()
    }

    /// Position of the first header equal to `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}
