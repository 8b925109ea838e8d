use serde::{Deserialize, Serialize};

/// An index over stored columns of one entity. Columns are property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub entity: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

/// A foreign key derived from a many-to-one or one-to-one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    /// Entity holding the reference column
    pub child_entity: String,
    /// Reference property on the child entity
    pub child_property: String,
    /// Entity whose primary key is referenced
    pub parent_entity: String,
}

impl ForeignKey {
    pub(crate) fn new(child_entity: &str, child_property: &str, parent_entity: &str) -> Self {
        ForeignKey {
            name: format!("fk_{}_{}_{}", child_entity, parent_entity, child_property),
            child_entity: child_entity.to_string(),
            child_property: child_property.to_string(),
            parent_entity: parent_entity.to_string(),
        }
    }
}
