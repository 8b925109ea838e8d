//! Join tree for one statement (or one correlated subquery).
//!
//! Every relationship traversal, whether from a fetch, a predicate or an ordering, goes
//! through [`JoinTree::ensure`], so a relationship reached twice from the same node
//! produces a single join.

use crate::dialect::SqlDialect;
use crate::mapping::{MappingError, MappingRegistry, RelationshipKind};

use super::errors::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner join",
            JoinType::Left => "left join",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    pub entity: String,
    pub alias: String,
    pub parent: Option<usize>,
    /// Relationship property on the parent entity that led here
    pub property: Option<String>,
    pub relationship: RelationshipKind,
    pub join_type: JoinType,
    /// Columns of this node are part of the projection
    pub fetched: bool,
    schema: Option<String>,
    table: String,
    /// (db column on the parent alias, db column on this alias)
    on: Option<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct JoinTree {
    nodes: Vec<JoinNode>,
}

impl JoinTree {
    /// A tree holding only the root entity, aliased `root_alias`. Joined aliases are
    /// `{root_alias}_1`, `{root_alias}_2`, ... in creation order.
    pub fn new(registry: &MappingRegistry, entity: &str, root_alias: &str) -> Result<Self, MappingError> {
        let map = registry.resolve(entity)?;
        Ok(JoinTree {
            nodes: vec![JoinNode {
                entity: map.name.clone(),
                alias: root_alias.to_string(),
                parent: None,
                property: None,
                relationship: RelationshipKind::None,
                join_type: JoinType::Inner,
                fetched: true,
                schema: map.schema.clone(),
                table: map.table.clone(),
                on: None,
            }],
        })
    }

    pub const ROOT: usize = 0;

    pub fn node(&self, index: usize) -> &JoinNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[JoinNode] {
        &self.nodes
    }

    pub fn root_alias(&self) -> &str {
        &self.nodes[Self::ROOT].alias
    }

    pub fn has_joins(&self) -> bool {
        self.nodes.len() > 1
    }

    pub fn find(&self, parent: usize, property: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.parent == Some(parent) && n.property.as_deref() == Some(property))
    }

    /// Returns the node reached from `parent` through `property`, adding the join on
    /// first use. A fetched request marks an existing join as fetched.
    pub fn ensure(
        &mut self,
        registry: &MappingRegistry,
        parent: usize,
        property: &str,
        fetched: bool,
    ) -> Result<usize, TranslationError> {
        if let Some(existing) = self.find(parent, property) {
            if fetched {
                self.nodes[existing].fetched = true;
            }
            return Ok(existing);
        }

        let parent_map = registry.resolve(&self.nodes[parent].entity)?;
        let column = parent_map.column(property)?;
        if column.is_ignored {
            return Err(MappingError::unknown_property(&parent_map.name, property).into());
        }

        let (related, on, join_type) = match column.relationship {
            RelationshipKind::ManyToOne | RelationshipKind::OneToOne => {
                let related = column.parent_map(registry)?;
                let on = (column.db_name.clone(), related.primary_key().db_name.clone());
                let join_type = if column.is_nullable {
                    JoinType::Left
                } else {
                    JoinType::Inner
                };
                (related, on, join_type)
            }
            RelationshipKind::OneToMany => {
                let child_column = column.child_column(registry)?;
                let related = registry.resolve(child_column.entity())?;
                let on = (
                    parent_map.primary_key().db_name.clone(),
                    child_column.db_name.clone(),
                );
                (related, on, JoinType::Left)
            }
            RelationshipKind::None => {
                return Err(MappingError::NotARelationship {
                    entity: parent_map.name.clone(),
                    property: property.to_string(),
                    expected: "many-to-one, one-to-one or one-to-many",
                }
                .into())
            }
        };

        let alias = format!("{}_{}", self.root_alias(), self.nodes.len());
        log::trace!(
            "Join {} {} as {} via {}.{}",
            join_type.keyword(),
            related.name,
            alias,
            self.nodes[parent].alias,
            property
        );
        self.nodes.push(JoinNode {
            entity: related.name.clone(),
            alias,
            parent: Some(parent),
            property: Some(property.to_string()),
            relationship: column.relationship,
            join_type,
            fetched,
            schema: related.schema.clone(),
            table: related.table.clone(),
            on: Some(on),
        });
        Ok(self.nodes.len() - 1)
    }

    /// `[Table] as alias` for the root.
    pub fn root_table_sql(&self, dialect: &dyn SqlDialect) -> String {
        let root = &self.nodes[Self::ROOT];
        format!(
            "{} as {}",
            dialect.quote_table_name(root.schema.as_deref(), &root.table),
            root.alias
        )
    }

    /// Every join clause, each with a leading space, in creation order.
    pub fn joins_sql(&self, dialect: &dyn SqlDialect) -> String {
        let mut sql = String::new();
        for node in &self.nodes[1..] {
            let (Some(parent), Some((parent_column, column))) = (node.parent, &node.on) else {
                continue;
            };
            sql.push_str(&format!(
                " {} {} as {} on {}.{} = {}.{}",
                node.join_type.keyword(),
                dialect.quote_table_name(node.schema.as_deref(), &node.table),
                node.alias,
                self.nodes[parent].alias,
                dialect.quote_identifier(parent_column),
                node.alias,
                dialect.quote_identifier(column)
            ));
        }
        sql
    }
}
