//! Fetched snapshots of object state.

use std::collections::BTreeMap;

use cay_types::{ObjectId, Value};

/// The stored state of one object as returned by a [`DataChannel`].
///
/// Attributes hold plain values. Relationships hold the ids of the related
/// objects, which the context turns into (possibly hollow) objects.
///
/// [`DataChannel`]: crate::traits::DataChannel
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataRow {
    pub attributes: BTreeMap<String, Value>,
    pub to_one: BTreeMap<String, Option<ObjectId>>,
    pub to_many: BTreeMap<String, Vec<ObjectId>>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn to_one(mut self, name: impl Into<String>, target: Option<ObjectId>) -> Self {
        self.to_one.insert(name.into(), target);
        self
    }

    pub fn to_many(mut self, name: impl Into<String>, targets: Vec<ObjectId>) -> Self {
        self.to_many.insert(name.into(), targets);
        self
    }
}
