//! In-memory channel and context for testing and ephemeral use.
//!
//! [`InMemoryDataChannel`] serves rows from a `HashMap`.
//! [`InMemoryObjectContext`] keeps its registered objects in a `HashMap`
//! keyed by [`ObjectId`] and resolves faults through any [`DataChannel`].
//! Dropping the context detaches every object it owns.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use cay_types::{ContextId, Key, ObjectId, PersistenceState, Persistent, Value};
use tracing::debug;

use crate::descriptor::{CollectionKind, Property, ToManyProperty};
use crate::error::{RuntimeError, RuntimeResult};
use crate::resolver::EntityResolver;
use crate::row::DataRow;
use crate::traits::{DataChannel, ObjectContext};

/// A [`DataChannel`] backed by a map of rows.
#[derive(Debug, Default)]
pub struct InMemoryDataChannel {
    rows: RwLock<HashMap<ObjectId, DataRow>>,
    fetches: AtomicUsize,
}

impl InMemoryDataChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the row for `id`.
    pub fn insert(&self, id: ObjectId, row: DataRow) {
        self.rows.write().expect("lock poisoned").insert(id, row);
    }

    /// Number of `fetch_row` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl DataChannel for InMemoryDataChannel {
    fn fetch_row(&self, id: &ObjectId) -> RuntimeResult<Option<DataRow>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows.read().expect("lock poisoned").get(id).cloned())
    }
}

/// An [`ObjectContext`] holding its objects in memory.
pub struct InMemoryObjectContext {
    id: ContextId,
    resolver: Arc<EntityResolver>,
    channel: Arc<dyn DataChannel>,
    objects: RwLock<HashMap<ObjectId, Persistent>>,
}

impl InMemoryObjectContext {
    pub fn new(resolver: Arc<EntityResolver>, channel: Arc<dyn DataChannel>) -> Self {
        Self {
            id: ContextId::new(),
            resolver,
            channel,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Register an object that already has an id with the given state.
    pub fn register_object(
        &self,
        object: &Persistent,
        state: PersistenceState,
    ) -> RuntimeResult<()> {
        let id = object
            .object_id()
            .ok_or_else(|| RuntimeError::MissingObjectId {
                entity: object.entity_name().to_string(),
            })?;
        object.register(self.id, state);
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(id, object.clone());
        Ok(())
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered objects, in no particular order.
    pub fn registered_objects(&self) -> Vec<Persistent> {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn check_owner(&self, object: &Persistent) -> RuntimeResult<()> {
        match object.context_id() {
            Some(owner) if owner != self.id => Err(RuntimeError::ForeignObject {
                object: format!("{object:?}"),
                owner: owner.to_string(),
                context: self.id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn fetch(&self, id: &ObjectId) -> RuntimeResult<DataRow> {
        self.channel
            .fetch_row(id)?
            .ok_or_else(|| RuntimeError::ObjectNotFound { id: id.to_string() })
    }

    fn copy_attributes(&self, source: &Persistent, target: &Persistent) {
        let Some(descriptor) = self.resolver.class_descriptor(target.entity_name()) else {
            return;
        };
        for property in descriptor.attributes() {
            if source.has_property(property.name()) {
                property.write_property_directly(target, property.read_property_directly(source));
            }
        }
    }

    fn fault_relationships(&self, object: &Persistent) {
        if let Some(descriptor) = self.resolver.class_descriptor(object.entity_name()) {
            for property in descriptor.relationships() {
                object.set_fault(property.name());
            }
        }
    }

    fn resolve_relationship(&self, object: &Persistent, property: &Property) -> RuntimeResult<()> {
        let id = object
            .object_id()
            .ok_or_else(|| RuntimeError::MissingObjectId {
                entity: object.entity_name().to_string(),
            })?;
        let row = self.fetch(&id)?;
        let value = match property {
            Property::Attribute(_) => return Ok(()),
            Property::ToOne(p) => match row.to_one.get(&p.name).cloned().flatten() {
                Some(target) => Value::Object(self.object_for_id(&target)?),
                None => Value::Null,
            },
            Property::ToMany(p) => {
                let targets = row.to_many.get(&p.name).cloned().unwrap_or_default();
                self.materialize_to_many(&id, p, targets)?
            }
        };
        debug!(object = %id, relationship = property.name(), "resolved relationship fault");
        property.write_property_directly(object, value);
        Ok(())
    }

    fn materialize_to_many(
        &self,
        owner: &ObjectId,
        property: &ToManyProperty,
        targets: Vec<ObjectId>,
    ) -> RuntimeResult<Value> {
        let mut objects = Vec::with_capacity(targets.len());
        for target in &targets {
            objects.push(self.object_for_id(target)?);
        }
        match &property.kind {
            CollectionKind::List => Ok(Value::List(objects.into_iter().map(Value::Object).collect())),
            CollectionKind::Set => Ok(Value::set(objects.into_iter().map(Value::Object))),
            CollectionKind::Map { key } => {
                let mut entries = BTreeMap::new();
                for object in objects {
                    let map_key = self.map_key(&object, key.as_deref())?;
                    if entries.contains_key(&map_key) {
                        return Err(RuntimeError::DuplicateMapKey {
                            key: map_key.to_string(),
                            relationship: property.name.clone(),
                            owner: owner.to_string(),
                        });
                    }
                    entries.insert(map_key, Value::Object(object));
                }
                Ok(Value::Map(entries))
            }
        }
    }

    fn map_key(&self, object: &Persistent, key_property: Option<&str>) -> RuntimeResult<Key> {
        let key = match key_property {
            Some(name) => {
                self.resolve(object)?;
                object.read_property_directly(name).to_key()
            }
            None => object.object_id().and_then(|id| id.single_key().cloned()),
        };
        key.ok_or_else(|| RuntimeError::InvalidMapKey {
            key_property: key_property.unwrap_or("<pk>").to_string(),
            object: format!("{object:?}"),
        })
    }
}

impl ObjectContext for InMemoryObjectContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn entity_resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    fn local_object(&self, source: &Persistent) -> RuntimeResult<Persistent> {
        let id = source
            .object_id()
            .ok_or_else(|| RuntimeError::MissingObjectId {
                entity: source.entity_name().to_string(),
            })?;
        let source_state = source.persistence_state();

        if let Some(cached) = self.registered_object(&id) {
            let locally_changed = matches!(
                cached.persistence_state(),
                PersistenceState::Modified | PersistenceState::Deleted
            );
            if !Persistent::ptr_eq(&cached, source) && !locally_changed && !source_state.is_hollow() {
                let promote = cached.persistence_state().is_hollow();
                if promote {
                    self.fault_relationships(&cached);
                }
                self.copy_attributes(source, &cached);
                if promote {
                    cached.set_persistence_state(PersistenceState::Committed);
                }
            }
            return Ok(cached);
        }

        self.resolver.require_descriptor(source.entity_name())?;
        let local = Persistent::new(source.entity_name());
        local.set_object_id(Some(id.clone()));
        if source_state.is_hollow() {
            self.register_object(&local, PersistenceState::Hollow)?;
        } else {
            self.register_object(&local, PersistenceState::Committed)?;
            self.copy_attributes(source, &local);
            self.fault_relationships(&local);
        }
        debug!(object = %id, context = %self.id, state = %local.persistence_state(), "created local object");
        Ok(local)
    }

    fn prepare_for_access(&self, object: &Persistent, property: &str) -> RuntimeResult<()> {
        self.check_owner(object)?;
        if object.context_id().is_none() {
            return Ok(());
        }
        self.resolve(object)?;
        let Some(descriptor) = self.resolver.class_descriptor(object.entity_name()) else {
            return Ok(());
        };
        match descriptor.property(property) {
            Some(p) if p.is_relationship() && p.is_fault(object) => self.resolve_relationship(object, p),
            _ => Ok(()),
        }
    }

    fn resolve(&self, object: &Persistent) -> RuntimeResult<()> {
        if !object.persistence_state().is_hollow() {
            return Ok(());
        }
        self.check_owner(object)?;
        let id = object
            .object_id()
            .ok_or_else(|| RuntimeError::MissingObjectId {
                entity: object.entity_name().to_string(),
            })?;
        let row = self.fetch(&id)?;
        for (name, value) in row.attributes {
            object.write_property_directly(&name, value);
        }
        self.fault_relationships(object);
        object.set_persistence_state(PersistenceState::Committed);
        debug!(object = %id, "resolved hollow object");
        Ok(())
    }

    fn object_for_id(&self, id: &ObjectId) -> RuntimeResult<Persistent> {
        if let Some(object) = self.registered_object(id) {
            return Ok(object);
        }
        self.resolver.require_descriptor(id.entity_name())?;
        let object = Persistent::with_id(id.clone());
        self.register_object(&object, PersistenceState::Hollow)?;
        Ok(object)
    }

    fn registered_object(&self, id: &ObjectId) -> Option<Persistent> {
        self.objects.read().expect("lock poisoned").get(id).cloned()
    }

    fn new_object(&self, entity_name: &str) -> RuntimeResult<Persistent> {
        let descriptor = self.resolver.require_descriptor(entity_name)?;
        let object = Persistent::with_id(ObjectId::temporary(entity_name));
        self.register_object(&object, PersistenceState::New)?;
        for property in descriptor.properties() {
            if let Property::ToMany(p) = property {
                object.write_property_directly(&p.name, p.kind.empty());
            }
        }
        Ok(object)
    }
}

impl Drop for InMemoryObjectContext {
    fn drop(&mut self) {
        let objects = match self.objects.get_mut() {
            Ok(objects) => objects,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, object) in objects.drain() {
            object.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cay_map::{
        CollectionType, DataMap, DbAttribute, DbEntity, DbRelationship, ObjAttribute, ObjEntity,
        ObjRelationship, SqlType,
    };

    fn resolver() -> Arc<EntityResolver> {
        resolver_with(|paintings| paintings)
    }

    fn resolver_with(
        configure: impl FnOnce(ObjRelationship) -> ObjRelationship,
    ) -> Arc<EntityResolver> {
        let mut map = DataMap::new("m");
        map.add_db_entity(
            DbEntity::new("ARTIST")
                .with_attribute(DbAttribute::new("ID", SqlType::Integer).primary_key())
                .with_relationship(
                    DbRelationship::new("paintingArray", "ARTIST", "PAINTING")
                        .to_many()
                        .join("ID", "ARTIST_ID"),
                ),
        )
        .unwrap();
        map.add_db_entity(
            DbEntity::new("PAINTING")
                .with_attribute(DbAttribute::new("ID", SqlType::Integer).primary_key())
                .with_attribute(DbAttribute::new("ARTIST_ID", SqlType::Integer))
                .with_relationship(
                    DbRelationship::new("toArtist", "PAINTING", "ARTIST").join("ARTIST_ID", "ID"),
                ),
        )
        .unwrap();
        let paintings = configure(
            ObjRelationship::new("paintings")
                .target("Painting")
                .via("paintingArray"),
        );
        map.add_obj_entity(
            ObjEntity::new("Artist")
                .mapped_to("ARTIST")
                .with_attribute(ObjAttribute::new("name"))
                .with_relationship(paintings),
        )
        .unwrap();
        map.add_obj_entity(
            ObjEntity::new("Painting")
                .mapped_to("PAINTING")
                .with_attribute(ObjAttribute::new("title"))
                .with_relationship(ObjRelationship::new("artist").target("Artist").via("toArtist")),
        )
        .unwrap();
        Arc::new(EntityResolver::new(map))
    }

    fn artist_id(v: i64) -> ObjectId {
        ObjectId::new("Artist", "ID", v)
    }

    fn painting_id(v: i64) -> ObjectId {
        ObjectId::new("Painting", "ID", v)
    }

    fn channel() -> Arc<InMemoryDataChannel> {
        let channel = InMemoryDataChannel::new();
        channel.insert(
            artist_id(1),
            DataRow::new()
                .attribute("name", "Monet")
                .to_many("paintings", vec![painting_id(10), painting_id(11)]),
        );
        channel.insert(
            painting_id(10),
            DataRow::new()
                .attribute("title", "Water Lilies")
                .to_one("artist", Some(artist_id(1))),
        );
        channel.insert(
            painting_id(11),
            DataRow::new()
                .attribute("title", "Water Lilies")
                .to_one("artist", Some(artist_id(1))),
        );
        Arc::new(channel)
    }

    #[test]
    fn hollow_object_resolves_on_access() {
        let channel = channel();
        let ctx = InMemoryObjectContext::new(resolver(), channel.clone());
        let artist = ctx.object_for_id(&artist_id(1)).unwrap();
        assert_eq!(artist.persistence_state(), PersistenceState::Hollow);
        assert_eq!(channel.fetch_count(), 0);

        ctx.prepare_for_access(&artist, "name").unwrap();
        assert_eq!(artist.persistence_state(), PersistenceState::Committed);
        assert_eq!(artist.read_property_directly("name"), Value::from("Monet"));
        assert!(artist.is_fault("paintings"));
        assert_eq!(channel.fetch_count(), 1);
    }

    #[test]
    fn relationship_fault_materializes_list() {
        let ctx = InMemoryObjectContext::new(resolver(), channel());
        let artist = ctx.object_for_id(&artist_id(1)).unwrap();
        ctx.prepare_for_access(&artist, "paintings").unwrap();

        let paintings = artist.read_property_directly("paintings");
        let members = paintings.elements().unwrap();
        assert_eq!(members.len(), 2);
        let first = members[0].as_object().unwrap();
        assert_eq!(first.persistence_state(), PersistenceState::Hollow);
        assert!(Persistent::ptr_eq(
            first,
            &ctx.registered_object(&painting_id(10)).unwrap()
        ));
    }

    #[test]
    fn to_one_fault_reuses_registered_object() {
        let ctx = InMemoryObjectContext::new(resolver(), channel());
        let artist = ctx.object_for_id(&artist_id(1)).unwrap();
        let painting = ctx.object_for_id(&painting_id(10)).unwrap();
        ctx.prepare_for_access(&painting, "artist").unwrap();
        let related = painting.read_property_directly("artist");
        assert!(Persistent::ptr_eq(related.as_object().unwrap(), &artist));
    }

    #[test]
    fn map_relationship_by_pk() {
        let r = resolver_with(|paintings| paintings.collection(CollectionType::Map));
        let ctx_pk = InMemoryObjectContext::new(r, channel());
        let artist = ctx_pk.object_for_id(&artist_id(1)).unwrap();
        ctx_pk.prepare_for_access(&artist, "paintings").unwrap();
        let Value::Map(entries) = artist.read_property_directly("paintings") else {
            panic!("expected map");
        };
        let keys: Vec<_> = entries.keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(10), Key::Int(11)]);
    }

    #[test]
    fn duplicate_map_key_reported() {
        let ctx = InMemoryObjectContext::new(resolver_with(|paintings| paintings.keyed_by("title")), channel());
        let artist = ctx.object_for_id(&artist_id(1)).unwrap();
        let err = ctx.prepare_for_access(&artist, "paintings").unwrap_err();
        match err {
            RuntimeError::DuplicateMapKey {
                key,
                relationship,
                owner,
            } => {
                assert_eq!(key, "Water Lilies");
                assert_eq!(relationship, "paintings");
                assert_eq!(owner, "<ObjectId:Artist, ID=1>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_row_is_not_found() {
        let ctx = InMemoryObjectContext::new(resolver(), channel());
        let ghost = ctx.object_for_id(&artist_id(99)).unwrap();
        assert!(matches!(
            ctx.resolve(&ghost),
            Err(RuntimeError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn foreign_objects_rejected() {
        let r = resolver();
        let a = InMemoryObjectContext::new(r.clone(), channel());
        let b = InMemoryObjectContext::new(r, channel());
        let artist = a.object_for_id(&artist_id(1)).unwrap();
        assert!(matches!(
            b.prepare_for_access(&artist, "name"),
            Err(RuntimeError::ForeignObject { .. })
        ));
    }

    #[test]
    fn local_object_copies_attributes_and_faults_relationships() {
        let r = resolver();
        let source_ctx = InMemoryObjectContext::new(r.clone(), channel());
        let target_ctx = InMemoryObjectContext::new(r, channel());
        let source = source_ctx.object_for_id(&artist_id(1)).unwrap();
        source_ctx.prepare_for_access(&source, "paintings").unwrap();

        let local = target_ctx.local_object(&source).unwrap();
        assert!(!Persistent::ptr_eq(&local, &source));
        assert_eq!(local.context_id(), Some(target_ctx.id()));
        assert_eq!(local.persistence_state(), PersistenceState::Committed);
        assert_eq!(local.read_property_directly("name"), Value::from("Monet"));
        assert!(local.is_fault("paintings"));

        let again = target_ctx.local_object(&source).unwrap();
        assert!(Persistent::ptr_eq(&local, &again));
    }

    #[test]
    fn local_object_of_hollow_source_is_hollow() {
        let r = resolver();
        let source_ctx = InMemoryObjectContext::new(r.clone(), channel());
        let target_ctx = InMemoryObjectContext::new(r, channel());
        let source = source_ctx.object_for_id(&artist_id(1)).unwrap();
        let local = target_ctx.local_object(&source).unwrap();
        assert_eq!(local.persistence_state(), PersistenceState::Hollow);
    }

    #[test]
    fn local_object_keeps_local_changes() {
        let r = resolver();
        let source_ctx = InMemoryObjectContext::new(r.clone(), channel());
        let target_ctx = InMemoryObjectContext::new(r, channel());
        let source = source_ctx.object_for_id(&artist_id(1)).unwrap();
        source_ctx.resolve(&source).unwrap();

        let local = target_ctx.object_for_id(&artist_id(1)).unwrap();
        let name = Property::attribute("name");
        name.write_property(&target_ctx, &local, Value::from("Manet"))
            .unwrap();
        assert_eq!(local.persistence_state(), PersistenceState::Modified);

        let merged = target_ctx.local_object(&source).unwrap();
        assert!(Persistent::ptr_eq(&merged, &local));
        assert_eq!(merged.read_property_directly("name"), Value::from("Manet"));
    }

    #[test]
    fn new_object_has_temporary_id_and_empty_collections() {
        let ctx = InMemoryObjectContext::new(resolver(), channel());
        let artist = ctx.new_object("Artist").unwrap();
        assert_eq!(artist.persistence_state(), PersistenceState::New);
        assert!(artist.object_id().unwrap().is_temporary());
        assert_eq!(artist.read_property_directly("paintings"), Value::List(vec![]));
        assert!(matches!(
            ctx.new_object("Nope"),
            Err(RuntimeError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn drop_detaches_objects() {
        let ctx = InMemoryObjectContext::new(resolver(), channel());
        let artist = ctx.object_for_id(&artist_id(1)).unwrap();
        ctx.prepare_for_access(&artist, "paintings").unwrap();
        assert_eq!(ctx.len(), 3);
        drop(ctx);
        assert_eq!(artist.persistence_state(), PersistenceState::Transient);
        assert!(artist.context_id().is_none());
        assert!(artist.property_names().is_empty());
    }
}
