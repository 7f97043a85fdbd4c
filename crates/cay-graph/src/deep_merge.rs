//! Deep merge of an object graph into another context.

use std::collections::BTreeMap;
use std::sync::Arc;

use cay_runtime::{ClassDescriptor, ObjectContext, Property, RuntimeError};
use cay_types::{Persistent, Value};
use tracing::debug;

use crate::cache::MergeCache;
use crate::error::{GraphError, GraphResult};

/// Copies the loaded part of an object graph into a destination context.
///
/// Each source object is replaced by the destination context's local object
/// with the same id. Relationships that are faulted on the source are left
/// alone on the target, so merging never triggers a fetch. Objects reached
/// more than once map to a single target; the identity cache that
/// guarantees this lives as long as the operation, or until
/// [`DeepMergeOperation::reset`].
///
/// `merge` takes `&mut self`: an operation serves one caller at a time.
/// Use one operation per thread.
pub struct DeepMergeOperation<'a, C: ObjectContext + ?Sized> {
    context: &'a C,
    cache: MergeCache,
}

impl<'a, C: ObjectContext + ?Sized> DeepMergeOperation<'a, C> {
    /// A merge operation into `context` with an empty cache.
    pub fn new(context: &'a C) -> Self {
        Self::with_cache(context, MergeCache::new())
    }

    pub fn with_cache(context: &'a C, cache: MergeCache) -> Self {
        Self { context, cache }
    }

    pub fn cache(&self) -> &MergeCache {
        &self.cache
    }

    pub fn into_cache(self) -> MergeCache {
        self.cache
    }

    /// Forget all objects merged so far.
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    /// Merge `source` into the destination context, describing it with
    /// `descriptor` or the matching sub-entity descriptor.
    pub fn merge(
        &mut self,
        source: &Persistent,
        descriptor: &Arc<ClassDescriptor>,
    ) -> GraphResult<Persistent> {
        let Some(id) = source.object_id() else {
            return Err(GraphError::MissingObjectId {
                entity: source.entity_name().to_string(),
            });
        };
        if let Some(target) = self.cache.get(&id) {
            return Ok(target);
        }

        let context = self.context;
        let target = context.local_object(source)?;
        self.cache.put(id.clone(), target.clone());
        debug!(object = %id, context = %context.id(), "merging object");

        let descriptor = context
            .entity_resolver()
            .subclass_descriptor(descriptor, source.entity_name());

        for property in descriptor.properties() {
            match property {
                Property::Attribute(_) => {}
                Property::ToOne(p) => {
                    if property.is_fault(source) {
                        continue;
                    }
                    let merged = match property.read_property_directly(source) {
                        Value::Null => Value::Null,
                        value => Value::Object(self.merge_related(&value, &p.name, &p.target_entity)?),
                    };
                    property.write_property_directly(&target, merged);
                }
                Property::ToMany(p) => {
                    if property.is_fault(source) {
                        continue;
                    }
                    let merged = match property.read_property_directly(source) {
                        Value::Null => p.kind.empty(),
                        Value::List(items) => Value::List(self.merge_all(&items, &p.name, &p.target_entity)?),
                        Value::Set(items) => Value::set(self.merge_all(&items, &p.name, &p.target_entity)?),
                        Value::Map(entries) => {
                            let mut merged = BTreeMap::new();
                            for (key, value) in entries {
                                let object = self.merge_related(&value, &p.name, &p.target_entity)?;
                                merged.insert(key, Value::Object(object));
                            }
                            Value::Map(merged)
                        }
                        other => {
                            return Err(GraphError::NotPersistent {
                                relationship: p.name.clone(),
                                type_name: other.type_name().to_string(),
                            })
                        }
                    };
                    property.write_property_directly(&target, merged);
                }
            }
        }

        Ok(target)
    }

    /// Merge `source` using the descriptor registered for its entity.
    pub fn merge_object(&mut self, source: &Persistent) -> GraphResult<Persistent> {
        let descriptor = self
            .context
            .entity_resolver()
            .require_descriptor(source.entity_name())?;
        self.merge(source, &descriptor)
    }

    fn merge_all(
        &mut self,
        items: &[Value],
        relationship: &str,
        target_entity: &str,
    ) -> GraphResult<Vec<Value>> {
        items
            .iter()
            .map(|item| {
                self.merge_related(item, relationship, target_entity)
                    .map(Value::Object)
            })
            .collect()
    }

    fn merge_related(
        &mut self,
        value: &Value,
        relationship: &str,
        target_entity: &str,
    ) -> GraphResult<Persistent> {
        let Value::Object(related) = value else {
            return Err(GraphError::NotPersistent {
                relationship: relationship.to_string(),
                type_name: value.type_name().to_string(),
            });
        };
        let resolver = self.context.entity_resolver();
        let descriptor = resolver
            .class_descriptor(target_entity)
            .or_else(|| resolver.class_descriptor(related.entity_name()))
            .ok_or_else(|| RuntimeError::UnknownEntity {
                name: related.entity_name().to_string(),
            })?;
        self.merge(related, &descriptor)
    }
}
