//! The [`ObjectContext`] and [`DataChannel`] traits.
//!
//! A context owns a uniqued set of objects and resolves their faults
//! through a channel. Graph algorithms only talk to these traits, so any
//! backend (in-memory, remote, database) can sit underneath.

use cay_types::{ContextId, ObjectId, Persistent};

use crate::error::RuntimeResult;
use crate::resolver::EntityResolver;
use crate::row::DataRow;

/// Source of stored object state.
pub trait DataChannel: Send + Sync {
    /// Fetch the row for `id`.
    ///
    /// Returns `Ok(None)` if no such object exists.
    fn fetch_row(&self, id: &ObjectId) -> RuntimeResult<Option<DataRow>>;
}

/// A set of persistent objects with unique identities.
///
/// Implementations must be thread-safe (`Send + Sync`). Each registered
/// object records the context's [`ContextId`]; objects owned by another
/// context are rejected.
pub trait ObjectContext: Send + Sync {
    fn id(&self) -> ContextId;

    fn entity_resolver(&self) -> &EntityResolver;

    /// The object in this context with the same id as `source`, an object
    /// usually owned by another context.
    ///
    /// An object already registered here keeps its identity. Unless it has
    /// local changes, it picks up `source`'s attribute values when `source`
    /// is resolved. Otherwise a new object is registered: COMMITTED with
    /// `source`'s attributes and every relationship faulted, or HOLLOW if
    /// `source` itself is hollow.
    fn local_object(&self, source: &Persistent) -> RuntimeResult<Persistent>;

    /// Resolve whatever reading `property` of `object` requires: the object
    /// itself when HOLLOW, then the relationship when faulted.
    fn prepare_for_access(&self, object: &Persistent, property: &str) -> RuntimeResult<()>;

    /// Load a HOLLOW object's state. No-op for resolved objects.
    fn resolve(&self, object: &Persistent) -> RuntimeResult<()>;

    /// The registered object for `id`, registering a HOLLOW one if needed.
    fn object_for_id(&self, id: &ObjectId) -> RuntimeResult<Persistent>;

    /// The registered object for `id`, if any. Never creates an object.
    fn registered_object(&self, id: &ObjectId) -> Option<Persistent>;

    /// Create and register a NEW object with a temporary id.
    fn new_object(&self, entity_name: &str) -> RuntimeResult<Persistent>;
}
