//! Error types for standards loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StandardsError {
    /// Standards directory not found.
    #[error("standards directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{origin} holds a {found} table, expected {expected}")]
    WrongKind {
        origin: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("unsupported {origin} version {found} (expected {expected})")]
    UnsupportedVersion {
        origin: String,
        found: u32,
        expected: u32,
    },

    #[error("invalid table in {origin}: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: shd_model::ModelError,
    },

    #[error("duplicate {what} '{name}' in {origin}")]
    Duplicate {
        what: &'static str,
        name: String,
        origin: String,
    },

    #[error("unknown schema '{name}'")]
    UnknownSchema { name: String },

    #[error("unknown region '{name}'")]
    UnknownRegion { name: String },
}

/// Result type for standards loading.
pub type Result<T> = std::result::Result<T, StandardsError>;
