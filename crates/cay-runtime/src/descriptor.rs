//! Class descriptors: per-entity property metadata.
//!
//! A [`ClassDescriptor`] lists an entity's properties, inherited ones first.
//! Each property is one of three closed variants ([`Property`]), so code that
//! walks an object graph dispatches with an exhaustive `match` instead of a
//! visitor.

use cay_map::{CollectionType, DataMap, ObjEntity};
use cay_types::{PersistenceState, Persistent, Value};

use crate::error::RuntimeResult;
use crate::traits::ObjectContext;

/// Container shape of a to-many property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    /// Keyed by the named attribute of the target, or by the target's
    /// single primary-key value when `key` is `None`.
    Map { key: Option<String> },
}

impl CollectionKind {
    /// An empty value of this container shape.
    pub fn empty(&self) -> Value {
        match self {
            Self::List => Value::List(Vec::new()),
            Self::Set => Value::Set(Vec::new()),
            Self::Map { .. } => Value::Map(Default::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeProperty {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToOneProperty {
    pub name: String,
    pub target_entity: String,
    pub reverse: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToManyProperty {
    pub name: String,
    pub target_entity: String,
    pub reverse: Option<String>,
    pub kind: CollectionKind,
}

/// A mapped property of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Property {
    Attribute(AttributeProperty),
    ToOne(ToOneProperty),
    ToMany(ToManyProperty),
}

impl Property {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(AttributeProperty { name: name.into() })
    }

    pub fn to_one(name: impl Into<String>, target_entity: impl Into<String>) -> Self {
        Self::ToOne(ToOneProperty {
            name: name.into(),
            target_entity: target_entity.into(),
            reverse: None,
        })
    }

    pub fn to_many(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        kind: CollectionKind,
    ) -> Self {
        Self::ToMany(ToManyProperty {
            name: name.into(),
            target_entity: target_entity.into(),
            reverse: None,
            kind,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Attribute(p) => &p.name,
            Self::ToOne(p) => &p.name,
            Self::ToMany(p) => &p.name,
        }
    }

    pub fn is_relationship(&self) -> bool {
        !matches!(self, Self::Attribute(_))
    }

    /// Target entity name for relationship properties.
    pub fn target_entity(&self) -> Option<&str> {
        match self {
            Self::Attribute(_) => None,
            Self::ToOne(p) => Some(&p.target_entity),
            Self::ToMany(p) => Some(&p.target_entity),
        }
    }

    /// Name of the complementary relationship on the target entity.
    pub fn reverse(&self) -> Option<&str> {
        match self {
            Self::Attribute(_) => None,
            Self::ToOne(p) => p.reverse.as_deref(),
            Self::ToMany(p) => p.reverse.as_deref(),
        }
    }

    /// Returns `true` if reading this property from `object` would require a
    /// fetch.
    pub fn is_fault(&self, object: &Persistent) -> bool {
        match self {
            Self::Attribute(_) => object.persistence_state().is_hollow(),
            Self::ToOne(_) | Self::ToMany(_) => object.is_fault(self.name()),
        }
    }

    /// Read the stored value with no fault resolution.
    pub fn read_property_directly(&self, object: &Persistent) -> Value {
        object.read_property_directly(self.name())
    }

    /// Store a value with no side effects. Returns the previous value.
    pub fn write_property_directly(&self, object: &Persistent, value: Value) -> Value {
        object.write_property_directly(self.name(), value)
    }

    /// Read the value, resolving the object or the relationship first if
    /// either is faulted.
    pub fn read_property<C>(&self, context: &C, object: &Persistent) -> RuntimeResult<Value>
    where
        C: ObjectContext + ?Sized,
    {
        context.prepare_for_access(object, self.name())?;
        Ok(self.read_property_directly(object))
    }

    /// Write the value after resolving faults. A committed object becomes
    /// modified. Returns the previous value.
    pub fn write_property<C>(
        &self,
        context: &C,
        object: &Persistent,
        value: Value,
    ) -> RuntimeResult<Value>
    where
        C: ObjectContext + ?Sized,
    {
        context.prepare_for_access(object, self.name())?;
        let previous = self.write_property_directly(object, value);
        if object.persistence_state() == PersistenceState::Committed {
            object.set_persistence_state(PersistenceState::Modified);
        }
        Ok(previous)
    }
}

/// Property metadata for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDescriptor {
    entity_name: String,
    super_entity_name: Option<String>,
    properties: Vec<Property>,
}

impl ClassDescriptor {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            super_entity_name: None,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.retain(|p| p.name() != property.name());
        self.properties.push(property);
        self
    }

    /// Build the descriptor of `entity`, including properties inherited from
    /// its super entities.
    pub fn from_entity(map: &DataMap, entity: &ObjEntity) -> Self {
        let mut descriptor = Self::new(entity.name.clone());
        descriptor.super_entity_name = entity.super_entity_name.clone();

        let chain = map.entity_chain(&entity.name);
        let lineage: Vec<&ObjEntity> = if chain.is_empty() {
            vec![entity]
        } else {
            chain.into_iter().rev().collect()
        };

        for ancestor in lineage {
            for attr in &ancestor.attributes {
                descriptor = descriptor.with_property(Property::attribute(attr.name.clone()));
            }
            for rel in &ancestor.relationships {
                let target = rel.target_entity.clone().unwrap_or_default();
                let reverse = map.reverse_obj_relationship(rel).map(|r| r.name.clone());
                let property = if map.is_to_many(rel) {
                    let kind = match rel.collection_type {
                        CollectionType::List => CollectionKind::List,
                        CollectionType::Set => CollectionKind::Set,
                        CollectionType::Map => CollectionKind::Map {
                            key: rel.map_key.clone(),
                        },
                    };
                    Property::ToMany(ToManyProperty {
                        name: rel.name.clone(),
                        target_entity: target,
                        reverse,
                        kind,
                    })
                } else {
                    Property::ToOne(ToOneProperty {
                        name: rel.name.clone(),
                        target_entity: target,
                        reverse,
                    })
                };
                descriptor = descriptor.with_property(property);
            }
        }
        descriptor
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn super_entity_name(&self) -> Option<&str> {
        self.super_entity_name.as_deref()
    }

    /// Properties in declaration order, inherited first.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| !p.is_relationship())
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_relationship())
    }
}
