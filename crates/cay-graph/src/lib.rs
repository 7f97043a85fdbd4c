//! Object graph algorithms for the Cayenne runtime.
//!
//! Everything here works against the [`ObjectContext`] abstraction from
//! `cay-runtime`, so the same code runs over in-memory contexts in tests
//! and over any other backend.
//!
//! # Key Types
//!
//! - [`read_nested_property`] -- Dot-path reads with to-many flattening
//! - [`DeepMergeOperation`] -- Copies a loaded graph into another context
//! - [`MergeCache`] -- Identity memo used by a merge operation
//! - [`pk_for_object`], [`object_for_pk`] -- Primary-key helpers
//!
//! [`ObjectContext`]: cay_runtime::ObjectContext

pub mod cache;
pub mod deep_merge;
pub mod error;
pub mod path;
pub mod pk;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::MergeCache;
pub use deep_merge::DeepMergeOperation;
pub use error::{GraphError, GraphResult};
pub use path::{make_path, read_nested_property, read_nested_value, COLLECTION_SIZE};
pub use pk::{build_id, compound_pk_for_object, long_pk_for_object, object_for_pk, pk_for_object};
