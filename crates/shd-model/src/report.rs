//! Audit records produced by type coercion.

use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// A cell that failed to convert and was replaced by a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Zero-based row index.
    pub row: usize,
    /// Raw text that failed to parse.
    pub value: String,
}

/// Coercion outcome for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCoercion {
    pub column: String,
    pub column_type: ColumnType,
    /// Rows in the column.
    pub total: usize,
    /// Rows holding a converted value.
    pub converted: usize,
    /// Rows that were already missing before conversion.
    pub missing_before: usize,
    /// Rows whose value failed to parse, in row order.
    pub failures: Vec<ParseFailure>,
}

impl ColumnCoercion {
    pub fn new(column: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            column: column.into(),
            column_type,
            total: 0,
            converted: 0,
            missing_before: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Missing values after conversion.
    pub fn missing_after(&self) -> usize {
        self.missing_before + self.failures.len()
    }

    /// Distinct failed values, in first-seen order.
    pub fn distinct_failures(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !seen.contains(&failure.value.as_str()) {
                seen.push(failure.value.as_str());
            }
        }
        seen
    }
}

/// Coercion outcome for a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    /// Columns declared but absent from the table and marked optional.
    #[serde(default)]
    pub skipped: Vec<String>,
    pub columns: Vec<ColumnCoercion>,
}

impl CoercionReport {
    pub fn total_failures(&self) -> usize {
        self.columns.iter().map(ColumnCoercion::failed).sum()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnCoercion> {
        self.columns.iter().find(|column| column.column == name)
    }

    pub fn has_failures(&self) -> bool {
        self.total_failures() > 0
    }
}
