//! Error types for the transformation stages.

use thiserror::Error;

/// Errors raised by normalization, merging, coercion and reshaping.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransformError {
    // =========================================================================
    // NORMALIZATION ERRORS
    // =========================================================================
    /// A header normalizes to nothing.
    #[error("column '{raw}' in {table} has no characters left after normalization")]
    EmptyColumnName {
        /// Source table label.
        table: String,
        /// Raw header text.
        raw: String,
    },

    /// Distinct raw headers normalize to the same canonical name.
    #[error("columns {sources:?} in {table} all normalize to '{canonical}'")]
    ColumnCollision {
        table: String,
        canonical: String,
        sources: Vec<String>,
    },

    /// A column rename targets a name the table already has.
    #[error("cannot rename '{from}' to '{to}' in {table}: '{to}' already exists")]
    RenameConflict {
        table: String,
        from: String,
        to: String,
    },

    // =========================================================================
    // MERGE ERRORS
    // =========================================================================
    /// Column not found in a table.
    #[error("column '{column}' not found in {table}")]
    ColumnNotFound { table: String, column: String },

    /// A joined table repeats a key, which would fan out the base rows.
    #[error("{table} has duplicate '{key}' values: {values:?}")]
    DuplicateJoinKey {
        table: String,
        key: String,
        values: Vec<String>,
    },

    /// A joined table carries a column the merged table already has.
    #[error("column '{column}' from {table} already exists in the merged table")]
    ColumnOverlap { table: String, column: String },

    /// A join changed the number of rows.
    #[error("joining {table} changed the row count from {before} to {after}")]
    RowCountDrift {
        table: String,
        before: usize,
        after: usize,
    },

    // =========================================================================
    // TIME SERIES ERRORS
    // =========================================================================
    /// Two snapshots carry the same year.
    #[error("more than one snapshot for year {year}")]
    DuplicateYear { year: String },

    // =========================================================================
    // SUBSET ERRORS
    // =========================================================================
    /// `latest` was requested but the year column holds no values.
    #[error("column '{column}' has no year values to select the latest from")]
    NoYearValues { column: String },

    // =========================================================================
    // WRAPPED ERRORS
    // =========================================================================
    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Result type for transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_names_every_source() {
        let err = TransformError::ColumnCollision {
            table: "plastic".to_string(),
            canonical: "rate".to_string(),
            sources: vec!["Rate".to_string(), "rate%".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"columns ["Rate", "rate%"] in plastic all normalize to 'rate'"#
        );
    }
}
