//! Object-level mapping: entities, attributes and relationships.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// What happens to related objects when the source object is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRule {
    #[default]
    NoAction,
    Nullify,
    Cascade,
    Deny,
}

impl DeleteRule {
    /// Rule assigned to newly created to-one relationships.
    pub const DEFAULT_TO_ONE: DeleteRule = DeleteRule::Nullify;
    /// Rule assigned to newly created to-many relationships.
    pub const DEFAULT_TO_MANY: DeleteRule = DeleteRule::Deny;
}

impl fmt::Display for DeleteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoAction => "No Action",
            Self::Nullify => "Nullify",
            Self::Cascade => "Cascade",
            Self::Deny => "Deny",
        };
        f.write_str(name)
    }
}

/// Container shape of a to-many relationship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    #[default]
    List,
    Set,
    Map,
}

/// A typed field mapped to a column, either directly (`"NAME"`) or through
/// relationships (`"toArtist.NAME"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjAttribute {
    pub name: String,
    #[serde(default)]
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub primitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_attribute_path: Option<String>,
}

impl ObjAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_name: String::new(),
            value_type: None,
            primitive: false,
            db_attribute_path: None,
        }
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn db_path(mut self, path: impl Into<String>) -> Self {
        self.db_attribute_path = Some(path.into());
        self
    }

    /// Returns `true` if the attribute maps to a column of a related table.
    pub fn is_flattened(&self) -> bool {
        self.db_attribute_path
            .as_deref()
            .is_some_and(|p| p.contains('.'))
    }

    /// Type label: the primitive name when `primitive` is set, the boxed
    /// name otherwise.
    pub fn type_name(&self) -> Option<&'static str> {
        let value_type = self.value_type?;
        if self.primitive {
            value_type.primitive_name().or(Some(value_type.name()))
        } else {
            Some(value_type.name())
        }
    }
}

/// An object relationship mapped onto a path of one or more db relationships.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjRelationship {
    pub name: String,
    #[serde(default)]
    pub source_entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity: Option<String>,
    #[serde(default)]
    pub db_relationship_path: Vec<String>,
    #[serde(default)]
    pub delete_rule: DeleteRule,
    #[serde(default)]
    pub collection_type: CollectionType,
    /// Target attribute used as the key of a map-typed relationship. `None`
    /// keys the map by the target's primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<String>,
}

impl ObjRelationship {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_entity: String::new(),
            target_entity: None,
            db_relationship_path: Vec::new(),
            delete_rule: DeleteRule::default(),
            collection_type: CollectionType::default(),
            map_key: None,
        }
    }

    pub fn target(mut self, target_entity: impl Into<String>) -> Self {
        self.target_entity = Some(target_entity.into());
        self
    }

    /// Append a db relationship to the mapped path.
    pub fn via(mut self, db_relationship: impl Into<String>) -> Self {
        self.db_relationship_path.push(db_relationship.into());
        self
    }

    pub fn collection(mut self, collection_type: CollectionType) -> Self {
        self.collection_type = collection_type;
        self
    }

    pub fn keyed_by(mut self, map_key: impl Into<String>) -> Self {
        self.collection_type = CollectionType::Map;
        self.map_key = Some(map_key.into());
        self
    }

    /// The db relationship path joined with dots.
    pub fn db_relationship_path_string(&self) -> String {
        self.db_relationship_path.join(".")
    }

    /// Returns `true` if the relationship spans more than one join hop.
    pub fn is_flattened(&self) -> bool {
        self.db_relationship_path.len() > 1
    }
}

/// A mapped object type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjEntity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_entity_name: Option<String>,
    #[serde(default)]
    pub attributes: Vec<ObjAttribute>,
    #[serde(default)]
    pub relationships: Vec<ObjRelationship>,
}

impl ObjEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_entity_name: None,
            super_entity_name: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn mapped_to(mut self, db_entity_name: impl Into<String>) -> Self {
        self.db_entity_name = Some(db_entity_name.into());
        self
    }

    pub fn extends(mut self, super_entity_name: impl Into<String>) -> Self {
        self.super_entity_name = Some(super_entity_name.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&ObjAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut ObjAttribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Append an attribute, setting its owning entity. Replaces an attribute
    /// with the same name.
    pub fn add_attribute(&mut self, mut attribute: ObjAttribute) {
        attribute.entity_name = self.name.clone();
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub fn with_attribute(mut self, attribute: ObjAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<ObjAttribute> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index))
    }

    pub fn relationship(&self, name: &str) -> Option<&ObjRelationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn relationship_mut(&mut self, name: &str) -> Option<&mut ObjRelationship> {
        self.relationships.iter_mut().find(|r| r.name == name)
    }

    /// Append a relationship, setting its source entity. Replaces a
    /// relationship with the same name.
    pub fn add_relationship(&mut self, mut relationship: ObjRelationship) {
        relationship.source_entity = self.name.clone();
        match self
            .relationships
            .iter_mut()
            .find(|r| r.name == relationship.name)
        {
            Some(existing) => *existing = relationship,
            None => self.relationships.push(relationship),
        }
    }

    pub fn with_relationship(mut self, relationship: ObjRelationship) -> Self {
        self.add_relationship(relationship);
        self
    }

    pub fn remove_relationship(&mut self, name: &str) -> Option<ObjRelationship> {
        let index = self.relationships.iter().position(|r| r.name == name)?;
        Some(self.relationships.remove(index))
    }

    /// The attribute mapped directly (not flattened) to `column`.
    pub fn attribute_for_db_attribute(&self, column: &str) -> Option<&ObjAttribute> {
        self.attributes
            .iter()
            .find(|a| a.db_attribute_path.as_deref() == Some(column))
    }

    /// Returns `true` if an attribute or relationship already uses `name`.
    pub fn has_property_named(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.relationship(name).is_some()
    }
}
