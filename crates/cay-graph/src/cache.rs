//! Identity-keyed memo of merged objects.

use std::collections::HashMap;

use cay_types::{ObjectId, Persistent};

/// Maps a source object's id to the target object already produced for it.
///
/// Owned by one merge operation. Entries live until [`MergeCache::reset`].
#[derive(Debug, Default)]
pub struct MergeCache {
    entries: HashMap<ObjectId, Persistent>,
}

impl MergeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> Option<Persistent> {
        self.entries.get(id).cloned()
    }

    /// Record the target for `id`. Returns the previous target, if any.
    pub fn put(&mut self, id: ObjectId, object: Persistent) -> Option<Persistent> {
        self.entries.insert(id, object)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    /// Drop all entries.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
