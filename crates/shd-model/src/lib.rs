//! Data model for the sustainability and happiness preparation jobs.
//!
//! Declared column types, versioned mapping tables, merge/normalization
//! policies and coercion audit records. Nothing here touches files or frames.

pub mod error;
pub mod mapping;
pub mod options;
pub mod report;
pub mod schema;

pub use error::{ModelError, Result};
pub use mapping::{MAPPING_TABLE_VERSION, MappingEntry, MappingKind, MappingTable, Region};
pub use options::{CollisionPolicy, OverlapPolicy, YearSelector};
pub use report::{CoercionReport, ColumnCoercion, ParseFailure};
pub use schema::{ColumnSpec, ColumnType, TableSchema, is_canonical_name};
