//! Runtime reflection and object contexts for the Cayenne object graph.
//!
//! This crate sits between the mapping metadata (`cay-map`) and the graph
//! algorithms (`cay-graph`). It compiles a data map into class descriptors
//! and defines the context abstraction through which objects are uniqued
//! and faults are resolved.
//!
//! # Key Types
//!
//! - [`ClassDescriptor`] -- Ordered properties of an entity, inherited first
//! - [`Property`] -- Closed sum type: attribute, to-one, or to-many
//! - [`EntityResolver`] -- Descriptor registry keyed by entity name
//! - [`ObjectContext`] -- Uniquing, local-object resolution, fault resolution
//! - [`DataChannel`] -- Source of [`DataRow`]s for fault resolution
//! - [`InMemoryObjectContext`], [`InMemoryDataChannel`] -- In-memory backends

pub mod descriptor;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod row;
pub mod traits;

pub use descriptor::{
    AttributeProperty, ClassDescriptor, CollectionKind, Property, ToManyProperty, ToOneProperty,
};
pub use error::{RuntimeError, RuntimeResult};
pub use memory::{InMemoryDataChannel, InMemoryObjectContext};
pub use resolver::EntityResolver;
pub use row::DataRow;
pub use traits::{DataChannel, ObjectContext};
