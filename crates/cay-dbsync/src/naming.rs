//! Naming strategy for synthesized entities, attributes and relationships.

use std::collections::BTreeSet;

use cay_map::{DataMap, DbAttribute, DbRelationship};

/// Proposes object-level names for table-level metadata.
///
/// Proposals may collide with names already in use; [`NameBuilder`]
/// resolves collisions.
pub trait ObjectNameGenerator: Send + Sync {
    /// Entity name for a table.
    fn obj_entity_name(&self, db_entity_name: &str) -> String;

    /// Attribute name for a column.
    fn obj_attribute_name(&self, column: &DbAttribute) -> String;

    /// Relationship name for a table relationship. `target_entity_name` is
    /// the object entity the new relationship will point at.
    fn relationship_name(&self, relationship: &DbRelationship, target_entity_name: &str) -> String;
}

/// Converts `UNDERSCORED_NAMES` to camel case.
///
/// To-one relationships are named after their single join column with an
/// `_ID` suffix dropped (`ARTIST_ID` becomes `artist`), falling back to the
/// target entity when the column is the source table's own key. To-many
/// relationships take the plural of the target entity (`Painting` becomes
/// `paintings`).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultObjectNameGenerator;

impl ObjectNameGenerator for DefaultObjectNameGenerator {
    fn obj_entity_name(&self, db_entity_name: &str) -> String {
        underscored_to_camel(db_entity_name, true)
    }

    fn obj_attribute_name(&self, column: &DbAttribute) -> String {
        underscored_to_camel(&column.name, false)
    }

    fn relationship_name(&self, relationship: &DbRelationship, target_entity_name: &str) -> String {
        let target = decapitalize(target_entity_name);
        if relationship.to_many {
            return pluralize(&target);
        }
        match relationship.joins.as_slice() {
            [join] => {
                let upper = join.source.to_ascii_uppercase();
                match upper.strip_suffix("_ID") {
                    Some(stem)
                        if !stem.is_empty()
                            && !stem.eq_ignore_ascii_case(&relationship.source_entity) =>
                    {
                        underscored_to_camel(&join.source[..stem.len()], false)
                    }
                    _ => target,
                }
            }
            _ => target,
        }
    }
}

/// Split on `_`, lower-case each word and capitalize all but the first
/// (or all, with `capitalize`). A name without underscores that already
/// mixes case keeps its inner casing.
pub fn underscored_to_camel(name: &str, capitalize: bool) -> String {
    let words: Vec<&str> = name.split('_').filter(|w| !w.is_empty()).collect();
    if words.len() == 1 {
        let word = words[0];
        let mixed = word.chars().any(|c| c.is_lowercase()) && word.chars().any(|c| c.is_uppercase());
        if mixed {
            return if capitalize {
                capitalize_first(word)
            } else {
                decapitalize(word)
            };
        }
    }

    let mut out = String::with_capacity(name.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 && !capitalize {
            out.push_str(&lower);
        } else {
            out.push_str(&capitalize_first(&lower));
        }
    }
    out
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn decapitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Names that shadow the intrinsic fields every persistent object exposes.
pub const RESERVED_PROPERTY_NAMES: [&str; 3] = ["objectId", "entityName", "persistenceState"];

/// Picks a property name that is free in an entity.
///
/// The base name is used as is when free. Otherwise the smallest numeric
/// suffix (`name1`, `name2`, ...) that makes it unique is appended. Names
/// of inherited properties and [`RESERVED_PROPERTY_NAMES`] count as taken.
#[derive(Clone, Debug)]
pub struct NameBuilder {
    taken: BTreeSet<String>,
    base_name: String,
}

impl NameBuilder {
    /// Base name used when none, or an empty one, is given.
    pub const DEFAULT_BASE_NAME: &'static str = "untitled";

    /// A builder checking against the properties of `entity` and its
    /// ancestors in `map`.
    pub fn for_entity(map: &DataMap, entity: &str) -> Self {
        let mut taken = BTreeSet::new();
        for e in map.entity_chain(entity) {
            taken.extend(e.attributes.iter().map(|a| a.name.clone()));
            taken.extend(e.relationships.iter().map(|r| r.name.clone()));
        }
        Self::with_taken(taken)
    }

    /// A builder checking against an explicit set of names.
    pub fn with_taken<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut taken: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        taken.extend(RESERVED_PROPERTY_NAMES.iter().map(|s| s.to_string()));
        Self {
            taken,
            base_name: Self::DEFAULT_BASE_NAME.to_string(),
        }
    }

    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        if !base_name.is_empty() {
            self.base_name = base_name;
        }
        self
    }

    pub fn name(&self) -> String {
        if !self.taken.contains(&self.base_name) {
            return self.base_name.clone();
        }
        (1u32..)
            .map(|n| format!("{}{n}", self.base_name))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or_else(|| self.base_name.clone())
    }
}
