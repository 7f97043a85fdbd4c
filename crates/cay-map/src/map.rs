//! The data map: a named collection of table entities and the object
//! entities mapped onto them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::{DbAttribute, DbEntity, DbRelationship};
use crate::error::{MapError, MapResult};
use crate::obj::{ObjEntity, ObjRelationship};

/// A mapping project unit.
///
/// Entities are kept in insertion order. Names are unique per kind; the
/// `add_*` methods reject duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMap {
    pub name: String,
    #[serde(default)]
    db_entities: Vec<DbEntity>,
    #[serde(default)]
    obj_entities: Vec<ObjEntity>,
}

impl DataMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_entities: Vec::new(),
            obj_entities: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Entity registry
    // ------------------------------------------------------------------

    pub fn db_entities(&self) -> &[DbEntity] {
        &self.db_entities
    }

    pub fn obj_entities(&self) -> &[ObjEntity] {
        &self.obj_entities
    }

    pub fn db_entity(&self, name: &str) -> Option<&DbEntity> {
        self.db_entities.iter().find(|e| e.name == name)
    }

    pub fn db_entity_mut(&mut self, name: &str) -> Option<&mut DbEntity> {
        self.db_entities.iter_mut().find(|e| e.name == name)
    }

    pub fn obj_entity(&self, name: &str) -> Option<&ObjEntity> {
        self.obj_entities.iter().find(|e| e.name == name)
    }

    pub fn obj_entity_mut(&mut self, name: &str) -> Option<&mut ObjEntity> {
        self.obj_entities.iter_mut().find(|e| e.name == name)
    }

    /// Like [`DataMap::obj_entity`], but a missing entity is an error.
    pub fn require_obj_entity(&self, name: &str) -> MapResult<&ObjEntity> {
        self.obj_entity(name).ok_or_else(|| MapError::UnknownEntity {
            kind: "obj",
            name: name.to_string(),
        })
    }

    pub fn add_db_entity(&mut self, entity: DbEntity) -> MapResult<()> {
        if self.db_entity(&entity.name).is_some() {
            return Err(MapError::DuplicateEntity {
                kind: "db",
                name: entity.name,
            });
        }
        let mut entity = entity;
        let owner = entity.name.clone();
        for rel in &mut entity.relationships {
            rel.source_entity = owner.clone();
        }
        self.db_entities.push(entity);
        Ok(())
    }

    pub fn add_obj_entity(&mut self, entity: ObjEntity) -> MapResult<()> {
        if self.obj_entity(&entity.name).is_some() {
            return Err(MapError::DuplicateEntity {
                kind: "obj",
                name: entity.name,
            });
        }
        let mut entity = entity;
        let owner = entity.name.clone();
        for attr in &mut entity.attributes {
            attr.entity_name = owner.clone();
        }
        for rel in &mut entity.relationships {
            rel.source_entity = owner.clone();
        }
        self.obj_entities.push(entity);
        Ok(())
    }

    pub fn remove_obj_entity(&mut self, name: &str) -> Option<ObjEntity> {
        let index = self.obj_entities.iter().position(|e| e.name == name)?;
        Some(self.obj_entities.remove(index))
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    /// The entity followed by its ancestors, nearest first. Stops at a
    /// missing super entity or a cycle.
    pub fn entity_chain(&self, name: &str) -> Vec<&ObjEntity> {
        let mut chain: Vec<&ObjEntity> = Vec::new();
        let mut next = self.obj_entity(name);
        while let Some(entity) = next {
            if chain.iter().any(|e| e.name == entity.name) {
                break;
            }
            chain.push(entity);
            next = entity
                .super_entity_name
                .as_deref()
                .and_then(|s| self.obj_entity(s));
        }
        chain
    }

    /// Returns `true` if `name` is `ancestor` or inherits from it.
    pub fn is_subentity_of(&self, name: &str, ancestor: &str) -> bool {
        self.entity_chain(name).iter().any(|e| e.name == ancestor)
    }

    /// The entity itself and every entity inheriting from it, directly or
    /// transitively.
    pub fn entity_with_sub_entities(&self, name: &str) -> Vec<&ObjEntity> {
        self.obj_entities
            .iter()
            .filter(|e| self.is_subentity_of(&e.name, name))
            .collect()
    }

    /// Name of the table an entity is stored in, inherited from the nearest
    /// ancestor that declares one.
    pub fn db_entity_name_for(&self, obj_entity: &str) -> Option<&str> {
        self.entity_chain(obj_entity)
            .into_iter()
            .find_map(|e| e.db_entity_name.as_deref())
    }

    pub fn db_entity_for(&self, obj_entity: &str) -> Option<&DbEntity> {
        self.db_entity_name_for(obj_entity)
            .and_then(|name| self.db_entity(name))
    }

    /// Object entities stored in `db_entity`, including inherited mappings.
    pub fn mapped_entities(&self, db_entity: &str) -> Vec<&ObjEntity> {
        self.obj_entities
            .iter()
            .filter(|e| self.db_entity_name_for(&e.name) == Some(db_entity))
            .collect()
    }

    // ------------------------------------------------------------------
    // Table-level queries
    // ------------------------------------------------------------------

    /// Relationships of any table that point at `db_entity`.
    pub fn incoming_relationships(&self, db_entity: &str) -> Vec<&DbRelationship> {
        self.db_entities
            .iter()
            .flat_map(|e| e.relationships.iter())
            .filter(|r| r.target_entity == db_entity)
            .collect()
    }

    /// Returns `true` if `column` of `db_entity` is the source of a join
    /// whose target column is a primary key of the target table.
    pub fn is_foreign_key(&self, db_entity: &str, column: &str) -> bool {
        let Some(entity) = self.db_entity(db_entity) else {
            return false;
        };
        entity.relationships.iter().any(|rel| {
            rel.joins.iter().any(|join| {
                join.source == column
                    && self
                        .db_entity(&rel.target_entity)
                        .and_then(|t| t.attribute(&join.target))
                        .is_some_and(|t| t.primary_key)
            })
        })
    }

    /// The relationship on the target table that walks `rel` backwards.
    pub fn reverse_db_relationship(&self, rel: &DbRelationship) -> Option<&DbRelationship> {
        self.db_entity(&rel.target_entity)?
            .relationships
            .iter()
            .find(|r| r.is_reverse_of(rel))
    }

    // ------------------------------------------------------------------
    // Object-level resolution
    // ------------------------------------------------------------------

    /// Resolve an attribute's db path to the column it ends at, following
    /// relationships for flattened paths.
    pub fn db_attribute_for_path(&self, obj_entity: &str, path: &str) -> Option<&DbAttribute> {
        let mut table = self.db_entity_for(obj_entity)?;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return table.attribute(segment);
            }
            let rel = table.relationship(segment)?;
            table = self.db_entity(&rel.target_entity)?;
        }
        None
    }

    /// The db relationships an object relationship is mapped onto, in path
    /// order. `None` if the path does not resolve.
    pub fn db_relationships_for(&self, rel: &ObjRelationship) -> Option<Vec<&DbRelationship>> {
        let mut table = self.db_entity_for(&rel.source_entity)?;
        let mut hops = Vec::with_capacity(rel.db_relationship_path.len());
        for name in &rel.db_relationship_path {
            let hop = table.relationship(name)?;
            hops.push(hop);
            table = self.db_entity(&hop.target_entity)?;
        }
        Some(hops)
    }

    /// Returns `true` if any hop of the relationship is to-many.
    pub fn is_to_many(&self, rel: &ObjRelationship) -> bool {
        self.db_relationships_for(rel)
            .is_some_and(|hops| hops.iter().any(|h| h.to_many))
    }

    /// The relationship on the target entity mapped onto the reversed db
    /// path of `rel`.
    pub fn reverse_obj_relationship(&self, rel: &ObjRelationship) -> Option<&ObjRelationship> {
        let hops = self.db_relationships_for(rel)?;
        let mut reversed = Vec::with_capacity(hops.len());
        for hop in hops.iter().rev() {
            reversed.push(self.reverse_db_relationship(hop)?.name.as_str());
        }
        let target = self.obj_entity(rel.target_entity.as_deref()?)?;
        target.relationships.iter().find(|r| {
            r.db_relationship_path.len() == reversed.len()
                && r.db_relationship_path
                    .iter()
                    .zip(&reversed)
                    .all(|(a, b)| a == b)
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Parse a map from JSON, validating entity names and fixing up owner
    /// references.
    pub fn from_json_str(json: &str) -> MapResult<Self> {
        let raw: DataMap = serde_json::from_str(json)?;
        let mut map = DataMap::new(raw.name);
        for entity in raw.db_entities {
            map.add_db_entity(entity)?;
        }
        for entity in raw.obj_entities {
            map.add_obj_entity(entity)?;
        }
        Ok(map)
    }

    pub fn to_json_string_pretty(&self) -> MapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> MapResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> MapResult<()> {
        fs::write(path, self.to_json_string_pretty()?)?;
        Ok(())
    }
}
