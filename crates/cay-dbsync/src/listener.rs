//! Hooks notified as synchronization adds properties.

use cay_map::{DbRelationship, DeleteRule, ObjAttribute, ObjRelationship};

/// Receives every attribute and relationship added during synchronization.
///
/// Listeners run synchronously, in registration order, after the property
/// has been attached to its entity. They may adjust the new property.
pub trait EntityMergeListener: Send + Sync {
    fn obj_attribute_added(&self, _attribute: &mut ObjAttribute) {}

    /// `db_relationship` is the table relationship the new relationship is
    /// mapped onto.
    fn obj_relationship_added(
        &self,
        _relationship: &mut ObjRelationship,
        _db_relationship: &DbRelationship,
    ) {
    }
}

/// Assigns the default delete rule to new relationships: nullify for
/// to-one, deny for to-many.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteRuleUpdater;

impl DeleteRuleUpdater {
    pub fn update(relationship: &mut ObjRelationship, to_many: bool) {
        relationship.delete_rule = if to_many {
            DeleteRule::DEFAULT_TO_MANY
        } else {
            DeleteRule::DEFAULT_TO_ONE
        };
    }
}

impl EntityMergeListener for DeleteRuleUpdater {
    fn obj_relationship_added(
        &self,
        relationship: &mut ObjRelationship,
        db_relationship: &DbRelationship,
    ) {
        Self::update(relationship, db_relationship.to_many);
    }
}
