//! Entity resolution: descriptor registry keyed by entity name.

use std::collections::HashMap;
use std::sync::Arc;

use cay_map::{DataMap, ObjEntity};

use crate::descriptor::ClassDescriptor;
use crate::error::{RuntimeError, RuntimeResult};

/// Registry of class descriptors compiled from a [`DataMap`].
///
/// Objects carry their entity name as a type tag; the resolver maps that
/// tag to a descriptor and answers subclass questions through the map's
/// inheritance chains.
#[derive(Debug)]
pub struct EntityResolver {
    map: DataMap,
    descriptors: HashMap<String, Arc<ClassDescriptor>>,
}

impl EntityResolver {
    pub fn new(map: DataMap) -> Self {
        let descriptors = map
            .obj_entities()
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    Arc::new(ClassDescriptor::from_entity(&map, e)),
                )
            })
            .collect();
        Self { map, descriptors }
    }

    pub fn data_map(&self) -> &DataMap {
        &self.map
    }

    pub fn obj_entity(&self, name: &str) -> Option<&ObjEntity> {
        self.map.obj_entity(name)
    }

    pub fn class_descriptor(&self, entity_name: &str) -> Option<Arc<ClassDescriptor>> {
        self.descriptors.get(entity_name).cloned()
    }

    pub fn require_descriptor(&self, entity_name: &str) -> RuntimeResult<Arc<ClassDescriptor>> {
        self.class_descriptor(entity_name)
            .ok_or_else(|| RuntimeError::UnknownEntity {
                name: entity_name.to_string(),
            })
    }

    /// The most specific descriptor for an object tagged `entity_name`.
    ///
    /// Returns the descriptor of `entity_name` when it is `base` or one of
    /// its sub entities, and `base` otherwise.
    pub fn subclass_descriptor(
        &self,
        base: &Arc<ClassDescriptor>,
        entity_name: &str,
    ) -> Arc<ClassDescriptor> {
        if entity_name == base.entity_name()
            || !self.map.is_subentity_of(entity_name, base.entity_name())
        {
            return Arc::clone(base);
        }
        self.class_descriptor(entity_name)
            .unwrap_or_else(|| Arc::clone(base))
    }

    /// Primary-key column names of the table an entity is stored in.
    pub fn primary_key_columns(&self, entity_name: &str) -> Vec<String> {
        self.map
            .db_entity_for(entity_name)
            .map(|t| t.primary_keys().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cay_map::{DbAttribute, DbEntity, SqlType};

    fn resolver() -> EntityResolver {
        let mut map = DataMap::new("m");
        map.add_db_entity(
            DbEntity::new("ARTIST")
                .with_attribute(DbAttribute::new("ARTIST_ID", SqlType::Bigint).primary_key()),
        )
        .unwrap();
        map.add_obj_entity(ObjEntity::new("Artist").mapped_to("ARTIST"))
            .unwrap();
        map.add_obj_entity(ObjEntity::new("FamousArtist").extends("Artist"))
            .unwrap();
        map.add_obj_entity(ObjEntity::new("Gallery")).unwrap();
        EntityResolver::new(map)
    }

    #[test]
    fn descriptors_for_every_entity() {
        let r = resolver();
        assert!(r.class_descriptor("Artist").is_some());
        assert!(r.class_descriptor("Gallery").is_some());
        assert!(matches!(
            r.require_descriptor("Nope"),
            Err(RuntimeError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn subclass_resolution() {
        let r = resolver();
        let base = r.require_descriptor("Artist").unwrap();
        let sub = r.subclass_descriptor(&base, "FamousArtist");
        assert_eq!(sub.entity_name(), "FamousArtist");
        // unrelated tags fall back to the base descriptor
        let other = r.subclass_descriptor(&base, "Gallery");
        assert_eq!(other.entity_name(), "Artist");
        assert!(Arc::ptr_eq(&r.subclass_descriptor(&base, "Artist"), &base));
    }

    #[test]
    fn pk_columns_inherited() {
        let r = resolver();
        assert_eq!(r.primary_key_columns("FamousArtist"), vec!["ARTIST_ID"]);
        assert!(r.primary_key_columns("Gallery").is_empty());
    }
}
