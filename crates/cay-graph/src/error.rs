//! Error types for graph operations.

use cay_runtime::RuntimeError;
use cay_types::TypeError;
use thiserror::Error;

/// Errors from path reads, merges, and primary-key helpers.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("the path must be supplied in order to lookup a nested property")]
    EmptyPath,

    #[error("the path is invalid because it starts with a period character: '{0}'")]
    PathStartsWithDot(String),

    #[error("the path is invalid because it ends with a period character: '{0}'")]
    PathEndsWithDot(String),

    /// An object without identity cannot be merged or tracked.
    #[error("object of entity {entity} has no ObjectId")]
    MissingObjectId { entity: String },

    /// A relationship holds something other than a persistent object.
    #[error("relationship '{relationship}' holds a non-persistent value of type {type_name}")]
    NotPersistent {
        relationship: String,
        type_name: String,
    },

    /// Neither the descriptor, the object, nor its fields know the property.
    #[error("no property '{property}' on {type_name}")]
    UnknownProperty { property: String, type_name: String },

    #[error("expected single column PK, got {count} columns, ID: {id}")]
    CompoundPk { count: usize, id: String },

    #[error("PK is not a number: {id}")]
    PkNotNumeric { id: String },

    #[error("PK of entity {entity} contains {count} columns, expected 1")]
    PkColumnCount { entity: String, count: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Convenience type alias for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
