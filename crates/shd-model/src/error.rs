use thiserror::Error;

/// Errors raised while validating model definitions.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unsupported {kind} table version {found} (expected {expected})")]
    UnsupportedVersion {
        kind: &'static str,
        found: u32,
        expected: u32,
    },

    #[error("{kind} table has an empty entry at position {index}")]
    EmptyEntry { kind: &'static str, index: usize },

    #[error("{kind} table maps '{from}' more than once")]
    DuplicateSource { kind: &'static str, from: String },

    #[error("{kind} table chains '{from}' -> '{via}' -> '{to}'")]
    ChainedEntry {
        kind: &'static str,
        from: String,
        via: String,
        to: String,
    },

    #[error("{kind} table maps '{from}' to itself")]
    SelfMapping { kind: &'static str, from: String },

    #[error("column rename target '{name}' is not a canonical column name")]
    NonCanonicalTarget { name: String },

    #[error("schema '{schema}' declares column '{column}' more than once")]
    DuplicateColumn { schema: String, column: String },

    #[error("region '{region}' lists '{member}' more than once")]
    DuplicateMember { region: String, member: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
