//! Error types for the mapping crate.

/// Errors from data map operations.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// An entity with this name is already part of the map.
    #[error("duplicate {kind} entity: {name}")]
    DuplicateEntity { kind: &'static str, name: String },

    /// A referenced entity does not exist.
    #[error("unknown {kind} entity: {name}")]
    UnknownEntity { kind: &'static str, name: String },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while loading or saving a map file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for map operations.
pub type MapResult<T> = Result<T, MapError>;
