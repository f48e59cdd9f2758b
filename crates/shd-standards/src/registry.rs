//! Loading and validation of the standards tables.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shd_model::{MappingKind, MappingTable, Region, TableSchema};

use crate::embedded;
use crate::error::{Result, StandardsError};

/// Version of the `regions.toml` and `schemas.toml` formats.
pub const STANDARDS_FILE_VERSION: u32 = 1;

/// Environment variable pointing at a directory of replacement tables.
pub const STANDARDS_ENV_VAR: &str = "SHD_STANDARDS_DIR";

#[derive(Debug, Deserialize)]
struct RegionsFile {
    version: u32,
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Debug, Deserialize)]
struct SchemasFile {
    version: u32,
    #[serde(default)]
    schemas: Vec<TableSchema>,
}

/// All mapping tables, regions and schemas used by the preparation jobs.
#[derive(Debug, Clone)]
pub struct Standards {
    pub column_renames: MappingTable,
    pub country_aliases: MappingTable,
    pub regions: Vec<Region>,
    pub schemas: Vec<TableSchema>,
}

impl Standards {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            column_renames: parse_mapping_table(
                embedded::COLUMN_RENAMES,
                MappingKind::ColumnRename,
                "embedded column_renames.toml",
            )?,
            country_aliases: parse_mapping_table(
                embedded::COUNTRY_ALIASES,
                MappingKind::CountryAlias,
                "embedded country_aliases.toml",
            )?,
            regions: parse_regions(embedded::REGIONS, "embedded regions.toml")?,
            schemas: parse_schemas(embedded::SCHEMAS, "embedded schemas.toml")?,
        })
    }

    /// Tables read from `dir`; a file absent from `dir` falls back to the
    /// embedded copy.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(StandardsError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
        let column_renames = match read_optional(dir, embedded::COLUMN_RENAMES_FILE)? {
            Some((text, origin)) => {
                parse_mapping_table(&text, MappingKind::ColumnRename, &origin)?
            }
            None => parse_mapping_table(
                embedded::COLUMN_RENAMES,
                MappingKind::ColumnRename,
                "embedded column_renames.toml",
            )?,
        };
        let country_aliases = match read_optional(dir, embedded::COUNTRY_ALIASES_FILE)? {
            Some((text, origin)) => {
                parse_mapping_table(&text, MappingKind::CountryAlias, &origin)?
            }
            None => parse_mapping_table(
                embedded::COUNTRY_ALIASES,
                MappingKind::CountryAlias,
                "embedded country_aliases.toml",
            )?,
        };
        let regions = match read_optional(dir, embedded::REGIONS_FILE)? {
            Some((text, origin)) => parse_regions(&text, &origin)?,
            None => parse_regions(embedded::REGIONS, "embedded regions.toml")?,
        };
        let schemas = match read_optional(dir, embedded::SCHEMAS_FILE)? {
            Some((text, origin)) => parse_schemas(&text, &origin)?,
            None => parse_schemas(embedded::SCHEMAS, "embedded schemas.toml")?,
        };
        Ok(Self {
            column_renames,
            country_aliases,
            regions,
            schemas,
        })
    }

    pub fn schema(&self, name: &str) -> Result<&TableSchema> {
        self.schemas
            .iter()
            .find(|schema| schema.name == name)
            .ok_or_else(|| StandardsError::UnknownSchema {
                name: name.to_string(),
            })
    }

    pub fn region(&self, name: &str) -> Result<&Region> {
        self.regions
            .iter()
            .find(|region| region.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StandardsError::UnknownRegion {
                name: name.to_string(),
            })
    }
}

/// Loads the standards from `dir`, then `SHD_STANDARDS_DIR`, then the
/// embedded tables.
pub fn load_standards(dir: Option<&Path>) -> Result<Standards> {
    if let Some(dir) = dir {
        tracing::debug!(dir = %dir.display(), "loading standards from directory");
        return Standards::from_dir(dir);
    }
    if let Ok(root) = std::env::var(STANDARDS_ENV_VAR) {
        let dir = PathBuf::from(root);
        tracing::debug!(dir = %dir.display(), "loading standards from {STANDARDS_ENV_VAR}");
        return Standards::from_dir(&dir);
    }
    Standards::embedded()
}

fn read_optional(dir: &Path, file: &str) -> Result<Option<(String, String)>> {
    let path = dir.join(file);
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "standards file absent, using embedded copy");
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|source| StandardsError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(Some((text, path.display().to_string())))
}

/// Parses and validates one mapping table of the expected kind.
pub fn parse_mapping_table(text: &str, expected: MappingKind, origin: &str) -> Result<MappingTable> {
    let table: MappingTable = toml::from_str(text).map_err(|source| StandardsError::Toml {
        origin: origin.to_string(),
        source,
    })?;
    if table.kind != expected {
        return Err(StandardsError::WrongKind {
            origin: origin.to_string(),
            found: table.kind.as_str(),
            expected: expected.as_str(),
        });
    }
    table.validate().map_err(|source| StandardsError::Invalid {
        origin: origin.to_string(),
        source,
    })?;
    Ok(table)
}

fn parse_regions(text: &str, origin: &str) -> Result<Vec<Region>> {
    let file: RegionsFile = toml::from_str(text).map_err(|source| StandardsError::Toml {
        origin: origin.to_string(),
        source,
    })?;
    check_version(file.version, origin)?;
    let mut names = BTreeSet::new();
    for region in &file.regions {
        if !names.insert(region.name.to_lowercase()) {
            return Err(StandardsError::Duplicate {
                what: "region",
                name: region.name.clone(),
                origin: origin.to_string(),
            });
        }
        region.validate().map_err(|source| StandardsError::Invalid {
            origin: origin.to_string(),
            source,
        })?;
    }
    Ok(file.regions)
}

fn parse_schemas(text: &str, origin: &str) -> Result<Vec<TableSchema>> {
    let file: SchemasFile = toml::from_str(text).map_err(|source| StandardsError::Toml {
        origin: origin.to_string(),
        source,
    })?;
    check_version(file.version, origin)?;
    let mut names = BTreeSet::new();
    for schema in &file.schemas {
        if !names.insert(schema.name.as_str()) {
            return Err(StandardsError::Duplicate {
                what: "schema",
                name: schema.name.clone(),
                origin: origin.to_string(),
            });
        }
        schema.validate().map_err(|source| StandardsError::Invalid {
            origin: origin.to_string(),
            source,
        })?;
    }
    Ok(file.schemas)
}

fn check_version(found: u32, origin: &str) -> Result<()> {
    if found != STANDARDS_FILE_VERSION {
        return Err(StandardsError::UnsupportedVersion {
            origin: origin.to_string(),
            found,
            expected: STANDARDS_FILE_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_tables_load() {
        let standards = Standards::embedded().unwrap();
        assert_eq!(
            standards.column_renames.get("life_exectancy"),
            Some("life_expectancy")
        );
        assert_eq!(
            standards.country_aliases.get("Czechia"),
            Some("Czech Republic")
        );
        assert_eq!(standards.region("EU27").unwrap().members.len(), 27);
        assert_eq!(standards.schema("renewables").unwrap().key, "entity");
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let result = parse_mapping_table(
            embedded::COUNTRY_ALIASES,
            MappingKind::ColumnRename,
            "test",
        );
        assert!(matches!(result, Err(StandardsError::WrongKind { .. })));
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let standards = Standards::embedded().unwrap();
        assert!(matches!(
            standards.schema("missing"),
            Err(StandardsError::UnknownSchema { .. })
        ));
    }
}
