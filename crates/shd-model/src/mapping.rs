//! Versioned rename and alias tables.
//!
//! Two kinds of finite, explicit mapping exist: column renames applied to
//! canonical column names (`life_exectancy` -> `life_expectancy`) and country
//! aliases applied to key values (`Czechia` -> `Czech Republic`). Both are
//! checked when loaded and never inferred.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::is_canonical_name;

/// Table format version understood by this build.
pub const MAPPING_TABLE_VERSION: u32 = 1;

/// What a mapping table rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    ColumnRename,
    CountryAlias,
}

impl MappingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MappingKind::ColumnRename => "column rename",
            MappingKind::CountryAlias => "country alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub from: String,
    pub to: String,
}

impl MappingEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A validated, versioned mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    pub kind: MappingKind,
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// Builds and validates a table from entries.
    pub fn new(kind: MappingKind, entries: Vec<MappingEntry>) -> Result<Self> {
        let table = Self {
            kind,
            version: MAPPING_TABLE_VERSION,
            entries,
        };
        table.validate()?;
        Ok(table)
    }

    /// An empty table of the given kind.
    pub fn empty(kind: MappingKind) -> Self {
        Self {
            kind,
            version: MAPPING_TABLE_VERSION,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replacement for `value`, if the table maps it.
    pub fn get(&self, value: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.from == value)
            .map(|entry| entry.to.as_str())
    }

    /// Entries as an ordered lookup map.
    pub fn to_map(&self) -> BTreeMap<&str, &str> {
        self.entries
            .iter()
            .map(|entry| (entry.from.as_str(), entry.to.as_str()))
            .collect()
    }

    /// Rejects unsupported versions, blank entries, duplicate sources,
    /// identity entries and chains (a target that is itself a source).
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind.as_str();
        if self.version != MAPPING_TABLE_VERSION {
            return Err(ModelError::UnsupportedVersion {
                kind,
                found: self.version,
                expected: MAPPING_TABLE_VERSION,
            });
        }
        let mut sources = BTreeMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.from.trim().is_empty() || entry.to.trim().is_empty() {
                return Err(ModelError::EmptyEntry { kind, index });
            }
            if entry.from == entry.to {
                return Err(ModelError::SelfMapping {
                    kind,
                    from: entry.from.clone(),
                });
            }
            if sources.insert(entry.from.as_str(), entry.to.as_str()).is_some() {
                return Err(ModelError::DuplicateSource {
                    kind,
                    from: entry.from.clone(),
                });
            }
            if self.kind == MappingKind::ColumnRename && !is_canonical_name(&entry.to) {
                return Err(ModelError::NonCanonicalTarget {
                    name: entry.to.clone(),
                });
            }
        }
        for entry in &self.entries {
            if let Some(next) = sources.get(entry.to.as_str()) {
                return Err(ModelError::ChainedEntry {
                    kind,
                    from: entry.from.clone(),
                    via: entry.to.clone(),
                    to: (*next).to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A named group of countries (e.g. EU-27).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub members: Vec<String>,
}

impl Region {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.members.iter().any(|member| member == country)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for member in &self.members {
            if !seen.insert(member.as_str()) {
                return Err(ModelError::DuplicateMember {
                    region: self.name.clone(),
                    member: member.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_target() {
        let table = MappingTable::new(
            MappingKind::CountryAlias,
            vec![MappingEntry::new("Czechia", "Czech Republic")],
        )
        .unwrap();
        assert_eq!(table.get("Czechia"), Some("Czech Republic"));
        assert_eq!(table.get("Czech Republic"), None);
    }

    #[test]
    fn chains_are_rejected() {
        let result = MappingTable::new(
            MappingKind::CountryAlias,
            vec![
                MappingEntry::new("Czechia", "Czech Republic"),
                MappingEntry::new("Czech Republic", "CZ"),
            ],
        );
        assert!(matches!(result, Err(ModelError::ChainedEntry { .. })));
    }

    #[test]
    fn column_rename_targets_must_be_canonical() {
        let result = MappingTable::new(
            MappingKind::ColumnRename,
            vec![MappingEntry::new("life_exectancy", "Life Expectancy")],
        );
        assert!(matches!(result, Err(ModelError::NonCanonicalTarget { .. })));
    }
}
