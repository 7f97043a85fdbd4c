//! Mapping metadata for the Cayenne object graph.
//!
//! A [`DataMap`] holds two parallel schema descriptions: tables
//! ([`DbEntity`]) with their columns and joins, and the object entities
//! ([`ObjEntity`]) mapped onto them. The map answers the cross-cutting
//! questions the runtime and the synchronizer need: which entities are
//! stored in a table, which columns are foreign keys, what an object
//! relationship's db path resolves to, and which relationship is its
//! reverse.
//!
//! # Key Types
//!
//! - [`DataMap`] -- Entity registry with JSON load/save
//! - [`DbEntity`], [`DbAttribute`], [`DbRelationship`], [`DbJoin`] -- Table schema
//! - [`ObjEntity`], [`ObjAttribute`], [`ObjRelationship`] -- Object mapping
//! - [`SqlType`], [`ValueType`] -- Column types and their object-level mapping

pub mod db;
pub mod error;
pub mod map;
pub mod obj;
pub mod types;

pub use db::{DbAttribute, DbEntity, DbJoin, DbRelationship};
pub use error::{MapError, MapResult};
pub use map::DataMap;
pub use obj::{CollectionType, DeleteRule, ObjAttribute, ObjEntity, ObjRelationship};
pub use types::{SqlType, ValueType};
