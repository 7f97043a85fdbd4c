//! Entity synchronization: brings object entities in line with the tables
//! they are mapped to.

use std::sync::{Arc, Mutex};

use cay_map::{DataMap, DbAttribute, DbEntity, DbRelationship, ObjAttribute, ObjRelationship, ValueType};
use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::error::{DbSyncError, DbSyncResult};
use crate::listener::{DeleteRuleUpdater, EntityMergeListener};
use crate::naming::{DefaultObjectNameGenerator, NameBuilder, ObjectNameGenerator};

/// Adds the attributes and relationships an object entity is missing
/// relative to its table.
///
/// Synchronization is additive, apart from the optional removal of
/// attributes mapped to foreign keys. Nothing is rolled back on failure.
///
/// A [`DeleteRuleUpdater`] is registered on construction so that every new
/// relationship gets a default delete rule.
pub struct EntityMergeSupport {
    name_generator: Arc<dyn ObjectNameGenerator>,
    listeners: Vec<Arc<dyn EntityMergeListener>>,
    config: MergeConfig,
}

impl EntityMergeSupport {
    pub fn new(config: MergeConfig) -> Self {
        Self::with_name_generator(config, Arc::new(DefaultObjectNameGenerator))
    }

    pub fn with_name_generator(
        config: MergeConfig,
        name_generator: Arc<dyn ObjectNameGenerator>,
    ) -> Self {
        Self {
            name_generator,
            listeners: vec![Arc::new(DeleteRuleUpdater)],
            config,
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn is_removing_meaningful_fks(&self) -> bool {
        self.config.remove_meaningful_fks
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Arc<dyn EntityMergeListener>) {
        self.listeners.push(listener);
    }

    /// Unregister a listener by handle identity. Returns `true` if it was
    /// registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn EntityMergeListener>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        match self
            .listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
        {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listeners(&self) -> &[Arc<dyn EntityMergeListener>] {
        &self.listeners
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Synchronize each named entity. Returns `true` if any entity changed.
    pub fn synchronize_with_db_entities<I, S>(
        &self,
        map: &Mutex<DataMap>,
        entities: I,
    ) -> DbSyncResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for name in entities {
            changed |= self.synchronize_with_db_entity(map, name.as_ref())?;
        }
        Ok(changed)
    }

    /// Synchronize one entity while holding the map lock, so concurrent
    /// synchronizations of the same map never interleave.
    pub fn synchronize_with_db_entity(&self, map: &Mutex<DataMap>, entity: &str) -> DbSyncResult<bool> {
        let mut guard = map.lock().map_err(|_| DbSyncError::LockPoisoned)?;
        Ok(self.synchronize(&mut guard, entity))
    }

    /// Synchronize every object entity of the map.
    pub fn synchronize_all(&self, map: &mut DataMap) -> bool {
        let names: Vec<String> = map.obj_entities().iter().map(|e| e.name.clone()).collect();
        let mut changed = false;
        for name in &names {
            changed |= self.synchronize(map, name);
        }
        changed
    }

    /// Synchronize one entity of a map the caller already has exclusive
    /// access to.
    ///
    /// Returns `false` without touching anything when the entity does not
    /// exist or is not mapped to a table.
    pub fn synchronize(&self, map: &mut DataMap, entity: &str) -> bool {
        if map.obj_entity(entity).is_none() || map.db_entity_for(entity).is_none() {
            return false;
        }

        let removed = if self.config.remove_meaningful_fks {
            self.remove_meaningful_fk_attributes(map, entity)
        } else {
            0
        };

        let columns: Vec<DbAttribute> = self
            .attributes_to_add(map, entity)
            .into_iter()
            .cloned()
            .collect();
        for column in &columns {
            self.add_missing_attribute(map, entity, column);
        }

        let relationships: Vec<DbRelationship> = self
            .relationships_to_add(map, entity)
            .into_iter()
            .cloned()
            .collect();
        let mut relationships_added = 0;
        for relationship in &relationships {
            relationships_added += self.add_missing_relationship(map, entity, relationship);
        }

        let changed = removed > 0 || !columns.is_empty() || relationships_added > 0;
        if changed {
            info!(
                entity,
                removed,
                attributes = columns.len(),
                relationships = relationships_added,
                "synchronized entity with table"
            );
        } else {
            debug!(entity, "entity already in sync");
        }
        changed
    }

    /// Map a column that was just added to the entity's table, if the
    /// policies allow it.
    pub fn synchronize_on_db_attribute_added(&self, map: &mut DataMap, entity: &str, column: &str) -> bool {
        let Some(table) = map.db_entity_for(entity) else {
            return false;
        };
        let Some(db_attribute) = table.attribute(column) else {
            return false;
        };
        let incoming = map.incoming_relationships(&table.name);
        if !self.should_add_attribute(map, entity, table, db_attribute, &incoming) {
            return false;
        }
        let db_attribute = db_attribute.clone();
        self.add_missing_attribute(map, entity, &db_attribute);
        true
    }

    /// Map a table relationship that was just added to the entity's table,
    /// unless an object relationship already covers it.
    pub fn synchronize_on_db_relationship_added(
        &self,
        map: &mut DataMap,
        entity: &str,
        relationship: &str,
    ) -> bool {
        let Some(db_relationship) = map
            .db_entity_for(entity)
            .and_then(|t| t.relationship(relationship))
        else {
            return false;
        };
        if !self.should_add_relationship(map, entity, db_relationship) {
            return false;
        }
        let db_relationship = db_relationship.clone();
        self.add_missing_relationship(map, entity, &db_relationship) > 0
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Columns mapped by attributes of `entity` that are foreign keys.
    pub fn meaningful_fks<'m>(&self, map: &'m DataMap, entity: &str) -> Vec<&'m DbAttribute> {
        let (Some(obj_entity), Some(table)) = (map.obj_entity(entity), map.db_entity_for(entity)) else {
            return Vec::new();
        };
        obj_entity
            .attributes
            .iter()
            .filter(|a| !a.is_flattened())
            .filter_map(|a| a.db_attribute_path.as_deref())
            .filter_map(|column| table.attribute(column))
            .filter(|column| map.is_foreign_key(&table.name, &column.name))
            .collect()
    }

    /// Columns of the entity's table that synchronization would map.
    pub fn attributes_to_add<'m>(&self, map: &'m DataMap, entity: &str) -> Vec<&'m DbAttribute> {
        let Some(table) = map.db_entity_for(entity) else {
            return Vec::new();
        };
        if map.obj_entity(entity).is_none() {
            return Vec::new();
        }
        let incoming = map.incoming_relationships(&table.name);
        table
            .attributes
            .iter()
            .filter(|column| self.should_add_attribute(map, entity, table, column, &incoming))
            .collect()
    }

    /// Relationships of the entity's table not yet represented on the
    /// entity.
    pub fn relationships_to_add<'m>(&self, map: &'m DataMap, entity: &str) -> Vec<&'m DbRelationship> {
        let Some(table) = map.db_entity_for(entity) else {
            return Vec::new();
        };
        if map.obj_entity(entity).is_none() {
            return Vec::new();
        }
        table
            .relationships
            .iter()
            .filter(|r| self.should_add_relationship(map, entity, r))
            .collect()
    }

    /// Returns `true` if an attribute of the entity or a sub-entity is
    /// flattened through `db_relationship`. Such a relationship is listed by
    /// [`relationships_to_add`](Self::relationships_to_add) but never created.
    pub fn is_relationship_blocked(
        &self,
        map: &DataMap,
        entity: &str,
        db_relationship: &DbRelationship,
    ) -> bool {
        has_flattened_attributes(map, entity, &db_relationship.name)
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    fn should_add_attribute(
        &self,
        map: &DataMap,
        entity: &str,
        table: &DbEntity,
        column: &DbAttribute,
        incoming: &[&DbRelationship],
    ) -> bool {
        if !column.has_name() || is_column_mapped(map, entity, &column.name) {
            return false;
        }

        let keep_pk = self.config.keeps_meaningful_pk(&table.name);
        if column.primary_key && !keep_pk {
            return false;
        }

        // a kept primary key may be a join column; anything else may not
        let excluded_join = |is_join: bool| is_join && !(keep_pk && column.primary_key);

        if excluded_join(table.is_join_source(&column.name)) {
            return false;
        }
        let is_join_target = incoming
            .iter()
            .any(|r| r.joins.iter().any(|j| j.target == column.name));
        if excluded_join(is_join_target) {
            return false;
        }

        !(self.config.remove_meaningful_fks && map.is_foreign_key(&table.name, &column.name))
    }

    fn should_add_relationship(&self, map: &DataMap, entity: &str, db_relationship: &DbRelationship) -> bool {
        if db_relationship.name.is_empty() {
            return false;
        }
        !map.entity_chain(entity).iter().any(|e| {
            e.relationships
                .iter()
                .any(|r| represents(map, r, db_relationship))
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    fn remove_meaningful_fk_attributes(&self, map: &mut DataMap, entity: &str) -> usize {
        let columns: Vec<String> = self
            .meaningful_fks(map, entity)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let Some(obj_entity) = map.obj_entity_mut(entity) else {
            return 0;
        };
        let mut removed = 0;
        for column in &columns {
            while let Some(name) = obj_entity
                .attribute_for_db_attribute(column)
                .map(|a| a.name.clone())
            {
                obj_entity.remove_attribute(&name);
                debug!(entity, attribute = %name, column = %column, "removed foreign key attribute");
                removed += 1;
            }
        }
        removed
    }

    fn add_missing_attribute(&self, map: &mut DataMap, entity: &str, column: &DbAttribute) {
        let name = NameBuilder::for_entity(map, entity)
            .base_name(self.name_generator.obj_attribute_name(column))
            .name();
        let value_type = ValueType::for_sql_type(column.sql_type);

        let mut attribute = ObjAttribute::new(name.clone()).db_path(column.name.clone());
        attribute.value_type = value_type;
        attribute.primitive =
            self.config.use_primitives && value_type.and_then(|t| t.primitive_name()).is_some();

        let Some(obj_entity) = map.obj_entity_mut(entity) else {
            return;
        };
        obj_entity.add_attribute(attribute);
        debug!(entity, attribute = %name, column = %column.name, "added attribute");
        if let Some(added) = obj_entity.attribute_mut(&name) {
            for listener in &self.listeners {
                listener.obj_attribute_added(added);
            }
        }
    }

    /// Add one object relationship per entity mapped to the target table,
    /// or one with a guessed target when there is none. Returns how many
    /// were added.
    fn add_missing_relationship(&self, map: &mut DataMap, entity: &str, db_relationship: &DbRelationship) -> usize {
        let targets: Vec<String> = map
            .mapped_entities(&db_relationship.target_entity)
            .iter()
            .map(|e| e.name.clone())
            .collect();

        if !targets.is_empty() {
            return targets
                .iter()
                .filter(|target| self.create_obj_relationship(map, entity, db_relationship, target))
                .count();
        }

        if db_relationship.target_entity.is_empty() {
            return 0;
        }
        let guessed = self.name_generator.obj_entity_name(&db_relationship.target_entity);
        warn!(
            db_relationship = %db_relationship.name,
            table = %db_relationship.target_entity,
            target_entity = %guessed,
            "no entity mapped to target table; relationship target is guessed"
        );
        usize::from(self.create_obj_relationship(map, entity, db_relationship, &guessed))
    }

    fn create_obj_relationship(
        &self,
        map: &mut DataMap,
        entity: &str,
        db_relationship: &DbRelationship,
        target: &str,
    ) -> bool {
        if self.is_relationship_blocked(map, entity, db_relationship) {
            debug!(
                entity,
                db_relationship = %db_relationship.name,
                "skipped relationship used by flattened attributes"
            );
            return false;
        }

        let name = NameBuilder::for_entity(map, entity)
            .base_name(self.name_generator.relationship_name(db_relationship, target))
            .name();
        let relationship = ObjRelationship::new(name.clone())
            .target(target)
            .via(db_relationship.name.clone());

        let Some(obj_entity) = map.obj_entity_mut(entity) else {
            return false;
        };
        obj_entity.add_relationship(relationship);
        debug!(entity, relationship = %name, target_entity = target, "added relationship");
        if let Some(added) = obj_entity.relationship_mut(&name) {
            for listener in &self.listeners {
                listener.obj_relationship_added(added, db_relationship);
            }
        }
        true
    }
}

impl Default for EntityMergeSupport {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}

/// Returns `true` if `entity` or an ancestor maps an attribute directly to
/// `column`.
fn is_column_mapped(map: &DataMap, entity: &str, column: &str) -> bool {
    map.entity_chain(entity)
        .iter()
        .any(|e| e.attribute_for_db_attribute(column).is_some())
}

/// Returns `true` if a hop of `relationship` joins the same tables on the
/// same ordered columns as `db_relationship`.
fn represents(map: &DataMap, relationship: &ObjRelationship, db_relationship: &DbRelationship) -> bool {
    map.db_relationships_for(relationship)
        .unwrap_or_default()
        .iter()
        .any(|hop| {
            hop.source_entity == db_relationship.source_entity
                && hop.target_entity == db_relationship.target_entity
                && hop.source_attribute_names() == db_relationship.source_attribute_names()
                && hop.target_attribute_names() == db_relationship.target_attribute_names()
        })
}

/// Returns `true` if the entity or one of its sub-entities has an
/// attribute mapped through the db relationship `path`.
fn has_flattened_attributes(map: &DataMap, entity: &str, path: &str) -> bool {
    map.entity_with_sub_entities(entity).iter().any(|e| {
        e.attributes.iter().any(|a| {
            a.db_attribute_path
                .as_deref()
                .and_then(|p| p.strip_prefix(path))
                .is_some_and(|rest| rest.starts_with('.'))
        })
    })
}
