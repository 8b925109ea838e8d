//! Projection and eager-load planning.
//!
//! A [`FetchPlan`] describes the flattened row a select returns: one segment per
//! fetched entity (root first, then joined entities in join order), each owning a
//! contiguous range of row positions. [`FetchPlan::assemble`] slices rows back into
//! per-entity values and rebuilds the object graph.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::dialect::SqlDialect;
use crate::mapping::{MappingRegistry, RelationshipKind};
use crate::query::{FetchKind, PropertyPath, Record, SelectQuery, Value};

use super::errors::TranslationError;
use super::join_tree::JoinTree;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedColumn {
    pub property: String,
    pub db_name: String,
    pub fetch_id: usize,
    /// For a reference column: the referenced entity and its key property.
    pub reference: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSegment {
    pub entity: String,
    pub alias: String,
    /// Path from the root; empty for the root segment
    pub path: PropertyPath,
    /// Index of the parent segment
    pub parent: Option<usize>,
    pub property: Option<String>,
    pub relationship: RelationshipKind,
    pub columns: Vec<ProjectedColumn>,
    /// Row positions of this segment, not counting leading columns
    pub range: Range<usize>,
    /// Position of the primary key within `columns`
    pub key: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchPlan {
    pub segments: Vec<FetchSegment>,
    /// Columns a paging rewrite puts in front of every row
    pub leading_columns: usize,
}

impl FetchPlan {
    /// Number of projected columns, leading columns excluded.
    pub fn width(&self) -> usize {
        self.segments.last().map(|s| s.range.end).unwrap_or(0)
    }

    /// The first fetched one-to-many relationship, if any.
    pub fn collection_path(&self) -> Option<&PropertyPath> {
        self.segments
            .iter()
            .find(|s| s.relationship == RelationshipKind::OneToMany)
            .map(|s| &s.path)
    }

    /// The projected column list. A column name already used by an earlier segment
    /// gets an `{alias}_{name}` alias.
    pub fn select_list(&self, dialect: &dyn SqlDialect) -> String {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.width());
        for segment in &self.segments {
            for column in &segment.columns {
                let sql = format!("{}.{}", segment.alias, dialect.quote_identifier(&column.db_name));
                if seen.insert(column.db_name.to_lowercase()) {
                    columns.push(sql);
                } else {
                    let alias = format!("{}_{}", segment.alias, column.db_name);
                    seen.insert(alias.to_lowercase());
                    columns.push(format!("{} as {}", sql, dialect.quote_identifier(&alias)));
                }
            }
        }
        columns.join(", ")
    }

    /// Rebuilds root records from flattened result rows.
    ///
    /// Rows of one root (same primary key) are merged; collection children are
    /// appended once each in first-seen order; a null key (left join miss) yields no
    /// child. References that were not fetched become key-only stubs.
    pub fn assemble(&self, rows: &[Vec<Value>]) -> Result<Vec<Record>, TranslationError> {
        let expected = self.leading_columns + self.width();
        let mut nodes: Vec<RowNode> = Vec::new();
        let mut roots = Vec::new();
        let mut index: HashMap<(Option<usize>, usize, String), usize> = HashMap::new();

        for row in rows {
            if row.len() != expected {
                return Err(TranslationError::MalformedRow {
                    expected,
                    actual: row.len(),
                });
            }
            let row = &row[self.leading_columns..];
            let mut row_nodes: Vec<Option<usize>> = vec![None; self.segments.len()];

            for (s, segment) in self.segments.iter().enumerate() {
                let parent_node = match segment.parent {
                    None => None,
                    Some(parent) => match row_nodes[parent] {
                        Some(node) => Some(node),
                        None => continue,
                    },
                };
                let values = &row[segment.range.clone()];
                let key = &values[segment.key];
                if key.is_null() {
                    continue;
                }

                let id = (parent_node, s, key.identity_key());
                let node = match index.get(&id) {
                    Some(&node) => node,
                    None => {
                        nodes.push(RowNode {
                            segment: s,
                            values: values.to_vec(),
                            children: Vec::new(),
                        });
                        let node = nodes.len() - 1;
                        index.insert(id, node);
                        match parent_node {
                            Some(parent) => nodes[parent].children.push(node),
                            None => roots.push(node),
                        }
                        node
                    }
                };
                row_nodes[s] = Some(node);
            }
        }

        log::trace!("Assembled {} rows into {} root records", rows.len(), roots.len());
        Ok(roots.iter().map(|&root| self.materialize(root, &nodes)).collect())
    }

    fn materialize(&self, node: usize, nodes: &[RowNode]) -> Record {
        let row_node = &nodes[node];
        let segment = &self.segments[row_node.segment];
        let mut record = Record::new(segment.entity.clone());

        for (column, value) in segment.columns.iter().zip(&row_node.values) {
            let value = match &column.reference {
                Some((entity, key)) if !value.is_null() => Value::Entity(Box::new(
                    Record::new(entity.clone()).with(key.clone(), value.clone()),
                )),
                _ => value.clone(),
            };
            record.set(column.property.clone(), value);
        }

        for (s, child) in self.segments.iter().enumerate() {
            if child.parent != Some(row_node.segment) {
                continue;
            }
            let Some(property) = &child.property else {
                continue;
            };
            let mut children = row_node
                .children
                .iter()
                .filter(|&&c| nodes[c].segment == s)
                .map(|&c| self.materialize(c, nodes));
            if child.relationship == RelationshipKind::OneToMany {
                record.set(property.clone(), Value::Collection(children.collect()));
            } else if let Some(fetched) = children.next() {
                record.set(property.clone(), Value::Entity(Box::new(fetched)));
            }
        }
        record
    }
}

struct RowNode {
    segment: usize,
    values: Vec<Value>,
    children: Vec<usize>,
}

pub struct FetchPlanner<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> FetchPlanner<'a> {
    pub fn new(registry: &'a MappingRegistry) -> Self {
        FetchPlanner { registry }
    }

    /// Adds the joins of every fetch directive to `tree` and lays out the projection.
    pub fn plan(&self, query: &SelectQuery, tree: &mut JoinTree) -> Result<FetchPlan, TranslationError> {
        self.add_fetches(query, tree)?;

        let mut segments: Vec<FetchSegment> = Vec::new();
        let mut segment_of_node: HashMap<usize, usize> = HashMap::new();
        let mut claimed = vec![false; query.includes.len() + query.excludes.len()];
        let mut offset = 0;

        for (n, node) in tree.nodes().iter().enumerate() {
            if !node.fetched {
                continue;
            }
            let parent = match node.parent {
                Some(p) => match segment_of_node.get(&p) {
                    Some(&segment) => Some(segment),
                    None => continue,
                },
                None => None,
            };
            let path = match parent {
                Some(p) => segments[p].path.join(&PropertyPath::from_segments(
                    node.property.iter().cloned().collect(),
                )),
                None => PropertyPath::from_segments(Vec::new()),
            };

            let map = self.registry.resolve(&node.entity)?;
            let mut included = HashSet::new();
            let mut excluded = HashSet::new();
            let overrides = query
                .includes
                .iter()
                .map(|p| (p, true))
                .chain(query.excludes.iter().map(|p| (p, false)));
            for (i, (override_path, include)) in overrides.enumerate() {
                if override_path.parent() != path {
                    continue;
                }
                let Some(property) = override_path.leaf() else {
                    continue;
                };
                let column = map.column(property)?;
                if !column.is_owned() {
                    return Err(TranslationError::invalid_fetch(
                        override_path,
                        "only stored columns can be included or excluded",
                    ));
                }
                claimed[i] = true;
                if include {
                    included.insert(property.to_string());
                } else {
                    excluded.insert(property.to_string());
                }
            }

            let mut columns = Vec::new();
            let mut key = 0;
            for column in map.owned_columns() {
                let selected = column.is_primary_key
                    || ((!column.is_excluded_by_default || included.contains(&column.name))
                        && !excluded.contains(&column.name));
                if !selected {
                    continue;
                }
                if column.is_primary_key {
                    key = columns.len();
                }
                let reference = if column.is_reference() {
                    let parent_map = column.parent_map(self.registry)?;
                    Some((parent_map.name.clone(), parent_map.primary_key().name.clone()))
                } else {
                    None
                };
                columns.push(ProjectedColumn {
                    property: column.name.clone(),
                    db_name: column.db_name.clone(),
                    fetch_id: column.fetch_id,
                    reference,
                });
            }

            let width = columns.len();
            segment_of_node.insert(n, segments.len());
            segments.push(FetchSegment {
                entity: node.entity.clone(),
                alias: node.alias.clone(),
                path,
                parent,
                property: node.property.clone(),
                relationship: node.relationship,
                columns,
                range: offset..offset + width,
                key,
            });
            offset += width;
        }

        let overrides = query.includes.iter().chain(query.excludes.iter());
        if let Some((unclaimed, _)) = overrides.zip(&claimed).find(|(_, claimed)| !**claimed) {
            return Err(TranslationError::invalid_fetch(
                unclaimed,
                "include and exclude must name a column of the root or of a fetched relationship",
            ));
        }

        log::trace!(
            "Fetch plan for {}: {} segments, {} columns",
            query.entity,
            segments.len(),
            offset
        );
        Ok(FetchPlan {
            segments,
            leading_columns: 0,
        })
    }

    fn add_fetches(&self, query: &SelectQuery, tree: &mut JoinTree) -> Result<(), TranslationError> {
        let mut previous: Option<PropertyPath> = None;
        for directive in &query.fetches {
            if directive.path.is_empty() {
                return Err(TranslationError::invalid_fetch(&directive.path, "empty path"));
            }
            let (absolute, chained_from) = match directive.kind {
                FetchKind::Fetch | FetchKind::FetchMany => (directive.path.clone(), 0),
                FetchKind::ThenFetch => {
                    let Some(base) = &previous else {
                        return Err(TranslationError::InvalidFetchChain {
                            path: directive.path.to_string(),
                            reason: "there is no preceding fetch or fetch_many".to_string(),
                        });
                    };
                    (base.join(&directive.path), base.len())
                }
            };

            let segments = absolute.segments();
            let mut node = JoinTree::ROOT;
            for (i, segment) in segments.iter().enumerate() {
                let entity = tree.node(node).entity.clone();
                let map = self.registry.resolve(&entity)?;
                let last = i + 1 == segments.len();
                let Some(column) = map.try_column(segment).filter(|c| !c.is_ignored) else {
                    if i >= chained_from && directive.kind == FetchKind::ThenFetch {
                        return Err(TranslationError::InvalidFetchChain {
                            path: directive.path.to_string(),
                            reason: format!("`{}` has no property `{}`", entity, segment),
                        });
                    }
                    return Err(TranslationError::invalid_fetch(
                        &absolute,
                        format!("`{}` has no property `{}`", entity, segment),
                    ));
                };

                match (column.relationship, directive.kind) {
                    (RelationshipKind::None, _) => {
                        return Err(TranslationError::invalid_fetch(
                            &absolute,
                            format!("`{}.{}` is not a relationship", entity, segment),
                        ));
                    }
                    (RelationshipKind::OneToMany, FetchKind::Fetch) => {
                        return Err(TranslationError::invalid_fetch(
                            &absolute,
                            format!("`{}.{}` is a collection; use fetch_many", entity, segment),
                        ));
                    }
                    (RelationshipKind::OneToMany, FetchKind::FetchMany) if !last => {
                        return Err(TranslationError::invalid_fetch(
                            &absolute,
                            "only the last segment of fetch_many may be a collection; use then_fetch",
                        ));
                    }
                    (RelationshipKind::ManyToOne | RelationshipKind::OneToOne, FetchKind::FetchMany)
                        if last =>
                    {
                        return Err(TranslationError::invalid_fetch(
                            &absolute,
                            format!("`{}.{}` is not a collection; use fetch", entity, segment),
                        ));
                    }
                    _ => {}
                }
                node = tree.ensure(self.registry, node, segment, true)?;
            }
            previous = Some(absolute);
        }
        Ok(())
    }
}
