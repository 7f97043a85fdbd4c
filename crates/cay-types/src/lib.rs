//! Foundation types for the Cayenne object graph.
//!
//! Every other `cay-*` crate depends on `cay-types`. It defines how objects
//! are identified, what state they are in, and what their properties hold.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Entity name plus primary-key snapshot (or temporary key)
//! - [`Key`] -- A primary-key component / map-relationship key
//! - [`ContextId`] -- Identity of the object context owning an object
//! - [`PersistenceState`] -- Lifecycle state (transient, new, hollow, ...)
//! - [`Persistent`] -- Shared handle to a persistent object
//! - [`Value`] -- Property value: scalar, related object, or collection
//! - [`FieldAccess`] -- Field lookup for unmapped values navigated by path

pub mod error;
pub mod object;
pub mod persistent;
pub mod state;
pub mod value;

pub use error::TypeError;
pub use object::{ContextId, Key, ObjectId};
pub use persistent::Persistent;
pub use state::PersistenceState;
pub use value::{FieldAccess, Value};
