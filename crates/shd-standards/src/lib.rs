//! Standards tables for the preparation jobs.
//!
//! Column renames, country aliases, named regions and column schemas ship as
//! TOML files compiled into the binary. A directory holding replacement files
//! can be given at runtime; any file it lacks falls back to the embedded copy.

pub mod embedded;
pub mod error;
pub mod registry;

pub use error::{Result, StandardsError};
pub use registry::{
    STANDARDS_ENV_VAR, STANDARDS_FILE_VERSION, Standards, load_standards, parse_mapping_table,
};
