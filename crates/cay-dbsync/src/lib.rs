//! Synchronization of object entities with their tables.
//!
//! [`EntityMergeSupport`] compares an object entity with the table it is
//! mapped to and adds the attributes and relationships it lacks. Which
//! columns count as "meaningful" keys to leave out is controlled by a
//! [`MergeConfig`]; names come from an [`ObjectNameGenerator`] and are made
//! unique by a [`NameBuilder`].
//!
//! # Key Types
//!
//! - [`EntityMergeSupport`] -- Attribute and relationship synthesis
//! - [`EntityMergeListener`] -- Notified of every addition
//! - [`DeleteRuleUpdater`] -- Default delete rules for new relationships
//! - [`MergeConfig`] -- Key policies, loadable from TOML
//! - [`NameFilter`] -- Table name patterns for the primary-key policy
//! - [`DefaultObjectNameGenerator`], [`NameBuilder`] -- Naming

pub mod config;
pub mod error;
pub mod filter;
pub mod listener;
pub mod naming;
pub mod support;

pub use config::MergeConfig;
pub use error::{DbSyncError, DbSyncResult};
pub use filter::{NameFilter, NamePatterns};
pub use listener::{DeleteRuleUpdater, EntityMergeListener};
pub use naming::{underscored_to_camel, DefaultObjectNameGenerator, NameBuilder, ObjectNameGenerator};
pub use support::EntityMergeSupport;
