use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// A single primary-key component.
///
/// Keys are also used to index map-typed to-many relationships, so they are
/// totally ordered and hashable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// The numeric value, if this is an integer key.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
enum IdKey {
    Permanent(BTreeMap<String, Key>),
    Temporary(Uuid),
}

/// Identity of a persistent object.
///
/// An `ObjectId` is the entity name plus either a permanent primary-key
/// snapshot (column name to value) or a random temporary key for objects
/// that have not been committed yet. Two objects with equal ids denote the
/// same row, so ids are used as map keys throughout the object graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    entity_name: String,
    key: IdKey,
}

impl ObjectId {
    /// Create a permanent id with a single primary-key column.
    pub fn new(entity_name: impl Into<String>, key_name: impl Into<String>, value: impl Into<Key>) -> Self {
        let mut snapshot = BTreeMap::new();
        snapshot.insert(key_name.into(), value.into());
        Self {
            entity_name: entity_name.into(),
            key: IdKey::Permanent(snapshot),
        }
    }

    /// Create a permanent id from a (possibly compound) key snapshot.
    pub fn from_snapshot(
        entity_name: impl Into<String>,
        snapshot: BTreeMap<String, Key>,
    ) -> Result<Self, TypeError> {
        let entity_name = entity_name.into();
        if entity_name.is_empty() {
            return Err(TypeError::EmptyEntityName);
        }
        if snapshot.is_empty() {
            return Err(TypeError::EmptyKey(entity_name));
        }
        Ok(Self {
            entity_name,
            key: IdKey::Permanent(snapshot),
        })
    }

    /// Create a fresh temporary id for a new, uncommitted object.
    pub fn temporary(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            key: IdKey::Temporary(Uuid::now_v7()),
        }
    }

    /// Name of the ObjEntity this id belongs to.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Returns `true` for ids of uncommitted objects.
    pub fn is_temporary(&self) -> bool {
        matches!(self.key, IdKey::Temporary(_))
    }

    /// The primary-key snapshot, or `None` for temporary ids.
    pub fn id_snapshot(&self) -> Option<&BTreeMap<String, Key>> {
        match &self.key {
            IdKey::Permanent(snapshot) => Some(snapshot),
            IdKey::Temporary(_) => None,
        }
    }

    /// The key snapshot, failing for temporary ids.
    pub fn require_snapshot(&self) -> Result<&BTreeMap<String, Key>, TypeError> {
        self.id_snapshot()
            .ok_or_else(|| TypeError::TemporaryId(self.to_string()))
    }

    /// The key value when the id has exactly one column.
    pub fn single_key(&self) -> Option<&Key> {
        match self.id_snapshot() {
            Some(snapshot) if snapshot.len() == 1 => snapshot.values().next(),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ObjectId:{}", self.entity_name)?;
        match &self.key {
            IdKey::Permanent(snapshot) => {
                for (name, value) in snapshot {
                    write!(f, ", {name}={value}")?;
                }
            }
            IdKey::Temporary(uuid) => write!(f, ", TEMP:{}", uuid.simple())?,
        }
        write!(f, ">")
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Identity of an object context, recorded on every object it owns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// A new random context id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        let simple = self.0.simple().to_string();
        format!("ctx:{}", &simple[..8])
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.short_id())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_id() {
        let a = ObjectId::new("Artist", "ARTIST_ID", 5);
        let b = ObjectId::new("Artist", "ARTIST_ID", 5i64);
        assert_eq!(a, b);
    }

    #[test]
    fn entity_name_is_part_of_identity() {
        let a = ObjectId::new("Artist", "ID", 1);
        let b = ObjectId::new("Painting", "ID", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn temporary_ids_are_unique() {
        let a = ObjectId::temporary("Artist");
        let b = ObjectId::temporary("Artist");
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(a.id_snapshot().is_none());
        assert!(a.require_snapshot().is_err());
    }

    #[test]
    fn compound_snapshot() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("A_ID".to_string(), Key::Int(1));
        snapshot.insert("B_ID".to_string(), Key::from("x"));
        let id = ObjectId::from_snapshot("Link", snapshot).unwrap();
        assert!(id.single_key().is_none());
        assert_eq!(id.id_snapshot().unwrap().len(), 2);
    }

    #[test]
    fn empty_snapshot_rejected() {
        let err = ObjectId::from_snapshot("Link", BTreeMap::new()).unwrap_err();
        assert_eq!(err, TypeError::EmptyKey("Link".into()));
        let err = ObjectId::from_snapshot("", BTreeMap::new()).unwrap_err();
        assert_eq!(err, TypeError::EmptyEntityName);
    }

    #[test]
    fn display_format() {
        let id = ObjectId::new("Artist", "ARTIST_ID", 33);
        assert_eq!(id.to_string(), "<ObjectId:Artist, ARTIST_ID=33>");
        let temp = ObjectId::temporary("Artist");
        assert!(temp.to_string().starts_with("<ObjectId:Artist, TEMP:"));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ObjectId::new("Artist", "ARTIST_ID", 7);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn context_short_id_format() {
        let ctx = ContextId::new();
        assert!(ctx.short_id().starts_with("ctx:"));
        assert_eq!(ctx.short_id().len(), 12);
    }
}
