use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty entity name")]
    EmptyEntityName,

    #[error("empty primary key for entity {0}")]
    EmptyKey(String),

    #[error("can't get primary key from temporary id: {0}")]
    TemporaryId(String),
}
