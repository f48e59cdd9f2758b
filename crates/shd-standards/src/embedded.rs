//! Standards tables embedded at compile time.

/// Column renames applied after normalization, before merging.
pub const COLUMN_RENAMES: &str = include_str!("../data/column_renames.toml");

/// Country key substitutions applied before region filtering.
pub const COUNTRY_ALIASES: &str = include_str!("../data/country_aliases.toml");

/// Named country groups.
pub const REGIONS: &str = include_str!("../data/regions.toml");

/// Declared column types per prepared table.
pub const SCHEMAS: &str = include_str!("../data/schemas.toml");

pub const COLUMN_RENAMES_FILE: &str = "column_renames.toml";
pub const COUNTRY_ALIASES_FILE: &str = "country_aliases.toml";
pub const REGIONS_FILE: &str = "regions.toml";
pub const SCHEMAS_FILE: &str = "schemas.toml";
