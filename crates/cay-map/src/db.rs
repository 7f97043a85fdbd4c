//! Table-level schema: entities, columns and joins.

use serde::{Deserialize, Serialize};

use crate::types::SqlType;

/// A table column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbAttribute {
    /// Column name. An empty name marks an incomplete column.
    pub name: String,
    pub sql_type: SqlType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl DbAttribute {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            mandatory: false,
            max_length: None,
        }
    }

    /// Mark the column as (part of) the primary key. Implies mandatory.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.mandatory = true;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// One hop of a relationship: a source column paired with a target column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbJoin {
    pub source: String,
    pub target: String,
}

impl DbJoin {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The same join walked in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

/// A table-to-table relationship defined by an ordered list of joins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbRelationship {
    pub name: String,
    pub source_entity: String,
    pub target_entity: String,
    #[serde(default)]
    pub to_many: bool,
    #[serde(default)]
    pub joins: Vec<DbJoin>,
}

impl DbRelationship {
    pub fn new(
        name: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
            to_many: false,
            joins: Vec::new(),
        }
    }

    pub fn to_many(mut self) -> Self {
        self.to_many = true;
        self
    }

    pub fn join(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.joins.push(DbJoin::new(source, target));
        self
    }

    /// Source column names, in join order.
    pub fn source_attribute_names(&self) -> Vec<&str> {
        self.joins.iter().map(|j| j.source.as_str()).collect()
    }

    /// Target column names, in join order.
    pub fn target_attribute_names(&self) -> Vec<&str> {
        self.joins.iter().map(|j| j.target.as_str()).collect()
    }

    /// Returns `true` if `other` walks the same joins in the opposite
    /// direction.
    pub fn is_reverse_of(&self, other: &DbRelationship) -> bool {
        if self.source_entity != other.target_entity
            || self.target_entity != other.source_entity
            || self.joins.len() != other.joins.len()
        {
            return false;
        }
        other
            .joins
            .iter()
            .all(|j| self.joins.contains(&j.reversed()))
    }
}

/// A table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbEntity {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<DbAttribute>,
    #[serde(default)]
    pub relationships: Vec<DbRelationship>,
}

impl DbEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&DbAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Append a column. Replaces an existing column with the same name.
    pub fn add_attribute(&mut self, attribute: DbAttribute) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub fn with_attribute(mut self, attribute: DbAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    pub fn relationship(&self, name: &str) -> Option<&DbRelationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Append a relationship, forcing its source to this table.
    pub fn add_relationship(&mut self, mut relationship: DbRelationship) {
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

    pub fn with_relationship(mut self, relationship: DbRelationship) -> Self {
        self.add_relationship(relationship);
        self
    }

    /// Primary-key columns, in column order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &DbAttribute> {
        self.attributes.iter().filter(|a| a.primary_key)
    }

    /// Returns `true` if `column` is the source side of any outgoing join.
    pub fn is_join_source(&self, column: &str) -> bool {
        self.relationships
            .iter()
            .any(|r| r.joins.iter().any(|j| j.source == column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painting() -> DbEntity {
        DbEntity::new("PAINTING")
            .with_attribute(DbAttribute::new("PAINTING_ID", SqlType::Integer).primary_key())
            .with_attribute(DbAttribute::new("ARTIST_ID", SqlType::Integer))
            .with_relationship(
                DbRelationship::new("toArtist", "", "ARTIST").join("ARTIST_ID", "ARTIST_ID"),
            )
    }

    #[test]
    fn add_relationship_sets_source() {
        let e = painting();
        assert_eq!(e.relationship("toArtist").unwrap().source_entity, "PAINTING");
    }

    #[test]
    fn add_attribute_replaces_by_name() {
        let mut e = painting();
        e.add_attribute(DbAttribute::new("ARTIST_ID", SqlType::Bigint));
        assert_eq!(e.attributes.len(), 2);
        assert_eq!(e.attribute("ARTIST_ID").unwrap().sql_type, SqlType::Bigint);
    }

    #[test]
    fn primary_key_implies_mandatory() {
        let e = painting();
        let pks: Vec<_> = e.primary_keys().map(|a| a.name.as_str()).collect();
        assert_eq!(pks, vec!["PAINTING_ID"]);
        assert!(e.attribute("PAINTING_ID").unwrap().mandatory);
    }

    #[test]
    fn join_source_detection() {
        let e = painting();
        assert!(e.is_join_source("ARTIST_ID"));
        assert!(!e.is_join_source("PAINTING_ID"));
    }

    #[test]
    fn reverse_detection() {
        let forward = DbRelationship::new("toArtist", "PAINTING", "ARTIST").join("ARTIST_ID", "ID");
        let reverse = DbRelationship::new("paintings", "ARTIST", "PAINTING")
            .to_many()
            .join("ID", "ARTIST_ID");
        let unrelated = DbRelationship::new("x", "ARTIST", "PAINTING").join("ID", "PAINTING_ID");
        assert!(forward.is_reverse_of(&reverse));
        assert!(reverse.is_reverse_of(&forward));
        assert!(!forward.is_reverse_of(&unrelated));
    }
}
