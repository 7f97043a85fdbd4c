//! Primary-key helpers.

use std::collections::BTreeMap;

use cay_runtime::{ObjectContext, RuntimeError};
use cay_types::{Key, ObjectId, Persistent};

use crate::error::{GraphError, GraphResult};

/// The full primary-key snapshot of a committed object.
///
/// Works for every key shape. Fails for objects without an id and for
/// temporary ids.
pub fn compound_pk_for_object(object: &Persistent) -> GraphResult<BTreeMap<String, Key>> {
    let id = require_id(object)?;
    Ok(id.require_snapshot()?.clone())
}

/// The primary-key value of an object with a single-column key.
pub fn pk_for_object(object: &Persistent) -> GraphResult<Key> {
    let id = require_id(object)?;
    let snapshot = id.require_snapshot()?;
    match id.single_key() {
        Some(key) => Ok(key.clone()),
        None => Err(GraphError::CompoundPk {
            count: snapshot.len(),
            id: id.to_string(),
        }),
    }
}

/// The primary-key value of an object with a single numeric key column.
pub fn long_pk_for_object(object: &Persistent) -> GraphResult<i64> {
    let key = pk_for_object(object)?;
    key.as_i64().ok_or_else(|| GraphError::PkNotNumeric {
        id: object
            .object_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
    })
}

/// Build the id of `entity_name` with primary-key value `pk`.
///
/// The entity's table must have exactly one primary-key column.
pub fn build_id<C>(context: &C, entity_name: &str, pk: impl Into<Key>) -> GraphResult<ObjectId>
where
    C: ObjectContext + ?Sized,
{
    let resolver = context.entity_resolver();
    if resolver.obj_entity(entity_name).is_none() {
        return Err(RuntimeError::UnknownEntity {
            name: entity_name.to_string(),
        }
        .into());
    }
    let columns = resolver.primary_key_columns(entity_name);
    match columns.as_slice() {
        [column] => Ok(ObjectId::new(entity_name, column.clone(), pk)),
        _ => Err(GraphError::PkColumnCount {
            entity: entity_name.to_string(),
            count: columns.len(),
        }),
    }
}

/// The object of `entity_name` whose single-column primary key is `pk`.
///
/// A registered object is returned without a fetch. Returns `Ok(None)` if
/// no such object exists.
pub fn object_for_pk<C>(
    context: &C,
    entity_name: &str,
    pk: impl Into<Key>,
) -> GraphResult<Option<Persistent>>
where
    C: ObjectContext + ?Sized,
{
    let id = build_id(context, entity_name, pk)?;
    let object = context.object_for_id(&id)?;
    match context.resolve(&object) {
        Ok(()) => Ok(Some(object)),
        Err(RuntimeError::ObjectNotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn require_id(object: &Persistent) -> GraphResult<ObjectId> {
    object.object_id().ok_or_else(|| GraphError::MissingObjectId {
        entity: object.entity_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{artist_id, context};
    use cay_types::{PersistenceState, TypeError, Value};

    fn link() -> Persistent {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("A_ID".to_string(), Key::Int(1));
        snapshot.insert("B_ID".to_string(), Key::Int(2));
        Persistent::with_id(ObjectId::from_snapshot("Link", snapshot).unwrap())
    }

    #[test]
    fn single_column_pk() {
        let artist = Persistent::with_id(artist_id(33));
        assert_eq!(pk_for_object(&artist).unwrap(), Key::Int(33));
        assert_eq!(long_pk_for_object(&artist).unwrap(), 33);
        let snapshot = compound_pk_for_object(&artist).unwrap();
        assert_eq!(snapshot.get("ARTIST_ID"), Some(&Key::Int(33)));
    }

    #[test]
    fn compound_pk() {
        let link = link();
        assert_eq!(compound_pk_for_object(&link).unwrap().len(), 2);
        assert!(matches!(
            pk_for_object(&link),
            Err(GraphError::CompoundPk { count: 2, .. })
        ));
    }

    #[test]
    fn non_numeric_pk() {
        let tag = Persistent::with_id(ObjectId::new("Tag", "CODE", "rust"));
        assert_eq!(pk_for_object(&tag).unwrap(), Key::from("rust"));
        assert!(matches!(
            long_pk_for_object(&tag),
            Err(GraphError::PkNotNumeric { .. })
        ));
    }

    #[test]
    fn temporary_and_missing_ids_rejected() {
        let temp = Persistent::with_id(ObjectId::temporary("Artist"));
        assert!(matches!(
            pk_for_object(&temp),
            Err(GraphError::Type(TypeError::TemporaryId(_)))
        ));
        assert!(matches!(
            compound_pk_for_object(&Persistent::new("Artist")),
            Err(GraphError::MissingObjectId { .. })
        ));
    }

    #[test]
    fn object_for_pk_fetches_by_single_column() {
        let (ctx, _) = context();
        let artist = object_for_pk(&ctx, "Artist", 1).unwrap().unwrap();
        assert_eq!(artist.object_id(), Some(artist_id(1)));
        assert_eq!(artist.persistence_state(), PersistenceState::Committed);
        assert_eq!(artist.read_property_directly("name"), Value::from("Monet"));

        let again = object_for_pk(&ctx, "Artist", 1).unwrap().unwrap();
        assert!(Persistent::ptr_eq(&artist, &again));
    }

    #[test]
    fn object_for_pk_missing_row() {
        let (ctx, _) = context();
        assert!(object_for_pk(&ctx, "Artist", 404).unwrap().is_none());
        assert!(matches!(
            object_for_pk(&ctx, "Nope", 1),
            Err(GraphError::Runtime(RuntimeError::UnknownEntity { .. }))
        ));
    }
}
