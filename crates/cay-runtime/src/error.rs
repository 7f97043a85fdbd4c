//! Error types for descriptors and object contexts.

use cay_map::MapError;
use cay_types::TypeError;
use thiserror::Error;

/// Errors raised while resolving entities or accessing objects through a
/// context.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No class descriptor is registered for the entity.
    #[error("unknown entity: {name}")]
    UnknownEntity { name: String },

    /// The entity has no property with this name.
    #[error("no property '{property}' in entity {entity}")]
    UnknownProperty { entity: String, property: String },

    /// An object needs an id for this operation but has none.
    #[error("object of entity {entity} has no ObjectId")]
    MissingObjectId { entity: String },

    /// The channel has no row for the id.
    #[error("object not found: {id}")]
    ObjectNotFound { id: String },

    /// The object is registered in a different context.
    #[error("object {object} belongs to context {owner}, not {context}")]
    ForeignObject {
        object: String,
        owner: String,
        context: String,
    },

    /// Two related objects produced the same key while indexing a map-typed
    /// to-many relationship.
    #[error("duplicate key '{key}' in relationship '{relationship}' of {owner}")]
    DuplicateMapKey {
        key: String,
        relationship: String,
        owner: String,
    },

    /// A related object has no value usable as a map key.
    #[error("no map key '{key_property}' on {object}")]
    InvalidMapKey { key_property: String, object: String },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Convenience type alias for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
