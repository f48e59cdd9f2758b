//! Declared column types for the prepared datasets.
//!
//! Source CSVs are read with every column as text. A [`TableSchema`] names the
//! columns that must be converted and the type each one converts to; columns
//! that are not declared pass through unchanged.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Target type of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Floating point indicator (HDI, life expectancy, SDGI, ...).
    Float,
    /// Currency-formatted text such as `$12,345`, parsed as a float after the
    /// decoration is removed.
    Currency,
    /// Whole number (calendar years).
    Integer,
    /// Trimmed text.
    Text,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Float => "float",
            ColumnType::Currency => "currency",
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
        }
    }

    /// Returns true when the column converts to `Float64`.
    pub fn is_float(self) -> bool {
        matches!(self, ColumnType::Float | ColumnType::Currency)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Canonical column name.
    pub name: String,

    /// Target type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// When true a table without this column is accepted.
    #[serde(default)]
    pub optional: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Column contract for one prepared table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Schema name (e.g. "global", "renewables").
    pub name: String,

    /// Country key column.
    pub key: String,

    /// Declared columns in conversion order.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.name == name)
    }

    /// Checks that every declared name is canonical and declared once.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for spec in &self.columns {
            if !is_canonical_name(&spec.name) {
                return Err(ModelError::NonCanonicalTarget {
                    name: spec.name.clone(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    schema: self.name.clone(),
                    column: spec.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Returns true for non-empty names made only of `[a-z0-9_]`.
pub fn is_canonical_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert!(is_canonical_name("per_capita_gdp"));
        assert!(is_canonical_name("sdgi"));
        assert!(!is_canonical_name(""));
        assert!(!is_canonical_name("Per Capita"));
        assert!(!is_canonical_name("gdp$"));
    }

    #[test]
    fn schema_rejects_duplicate_columns() {
        let schema = TableSchema::new("global", "country")
            .with_column(ColumnSpec::new("hdi", ColumnType::Float))
            .with_column(ColumnSpec::new("hdi", ColumnType::Currency));
        assert!(matches!(
            schema.validate(),
            Err(ModelError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn column_type_deserializes_snake_case() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{"name":"per_capita_gdp","type":"currency"}"#).unwrap();
        assert_eq!(spec.column_type, ColumnType::Currency);
        assert!(!spec.optional);
    }
}
