//! Predicate translation: [`Expr`] trees to SQL boolean fragments.
//!
//! The walk is depth-first and left to right, and parameters are bound at the moment
//! their placeholder is written, so the parameter list always matches the order of
//! placeholders in the text. Property paths are resolved against the mapping registry;
//! each reference traversal goes through the statement's [`JoinTree`].

use crate::dialect::SqlDialect;
use crate::mapping::{Column, DbType, EntityMap, MappingError, MappingRegistry, RelationshipKind};
use crate::query::{CompareOp, Expr, PropertyPath, Value};

use super::errors::TranslationError;
use super::join_tree::JoinTree;
use super::params::Parameters;

const ALWAYS_TRUE: &str = "1 = 1";
const ALWAYS_FALSE: &str = "1 = 0";

/// A property path resolved to SQL.
struct ColumnRef<'r> {
    sql: String,
    /// Mapping of the value stored in the column. For a `Reference.Key` shortcut this
    /// is the referenced key column.
    column: &'r Column,
}

enum Operand<'r> {
    Column(ColumnRef<'r>),
    Value(Value),
}

pub struct WhereClauseWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
    qualify: bool,
    subqueries: usize,
}

impl<'a> WhereClauseWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        WhereClauseWriter {
            registry,
            dialect,
            qualify: true,
            subqueries: 0,
        }
    }

    /// Root columns are written without the table alias, for single-table
    /// update and delete statements.
    pub fn unqualified(mut self) -> Self {
        self.qualify = false;
        self
    }

    /// AND-combines `predicates`; `None` when there are none.
    pub fn write_all(
        &mut self,
        predicates: &[Expr],
        tree: &mut JoinTree,
        params: &mut Parameters,
    ) -> Result<Option<String>, TranslationError> {
        let mut parts = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            parts.push(self.write(predicate, tree, params)?);
        }
        Ok(if parts.is_empty() {
            None
        } else {
            Some(parts.join(" and "))
        })
    }

    pub fn write(
        &mut self,
        predicate: &Expr,
        tree: &mut JoinTree,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        if self.dialect.pushes_negation_to_leaves() {
            let pushed = push_negation(predicate.clone());
            self.visit(&pushed, tree, JoinTree::ROOT, params)
        } else {
            self.visit(predicate, tree, JoinTree::ROOT, params)
        }
    }

    /// SQL for a property path used outside a predicate, e.g. in an order clause.
    pub fn column_sql(&self, path: &PropertyPath, tree: &mut JoinTree) -> Result<String, TranslationError> {
        Ok(self.resolve_column(path, tree, JoinTree::ROOT)?.sql)
    }

    fn visit(
        &mut self,
        expr: &Expr,
        tree: &mut JoinTree,
        node: usize,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        match expr {
            Expr::And(left, right) => {
                let left = self.visit(left, tree, node, params)?;
                let right = self.visit(right, tree, node, params)?;
                Ok(format!("({} and {})", left, right))
            }
            Expr::Or(left, right) => {
                let left = self.visit(left, tree, node, params)?;
                let right = self.visit(right, tree, node, params)?;
                Ok(format!("({} or {})", left, right))
            }
            Expr::Not(inner) => {
                let sql = self.visit(inner, tree, node, params)?;
                match &**inner {
                    Expr::And(..) | Expr::Or(..) => Ok(format!("not {}", sql)),
                    _ => Ok(format!("not ({})", sql)),
                }
            }
            Expr::Compare { left, op, right } => {
                self.comparison(left, *op, right, tree, node, params)
            }
            Expr::In { path, values } => self.membership(path, values, tree, node, params),
            Expr::Any {
                collection,
                predicate,
            } => self.exists(collection, predicate.as_deref(), tree, node, params),
            Expr::PathRef(path) => {
                let column = self.resolve_column(path, tree, node)?;
                if column.column.db_type != DbType::Boolean || column.column.is_reference() {
                    return Err(TranslationError::unsupported(format!(
                        "`{}` is not a boolean property",
                        path
                    )));
                }
                let placeholder = params.add(Value::Bool(true));
                Ok(format!("{} = {}", column.sql, placeholder))
            }
            Expr::Literal(Value::Bool(true)) => Ok(ALWAYS_TRUE.to_string()),
            Expr::Literal(Value::Bool(false)) => Ok(ALWAYS_FALSE.to_string()),
            Expr::Literal(other) => Err(TranslationError::unsupported(format!(
                "literal {:?} used as a predicate",
                other
            ))),
        }
    }

    fn comparison(
        &mut self,
        left: &Expr,
        op: CompareOp,
        right: &Expr,
        tree: &mut JoinTree,
        node: usize,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        let left = self.operand(left, tree, node)?;
        let right = self.operand(right, tree, node)?;
        match (left, right) {
            (Operand::Column(column), Operand::Value(value)) => {
                self.compare_value(column, op, value, params)
            }
            (Operand::Value(value), Operand::Column(column)) => {
                self.compare_value(column, op.flip(), value, params)
            }
            (Operand::Column(left), Operand::Column(right)) => {
                Ok(format!("{} {} {}", left.sql, op.symbol(), right.sql))
            }
            (Operand::Value(_), Operand::Value(_)) => Err(TranslationError::unsupported(
                "comparison between two literals",
            )),
        }
    }

    fn operand(
        &self,
        expr: &Expr,
        tree: &mut JoinTree,
        node: usize,
    ) -> Result<Operand<'a>, TranslationError> {
        match expr {
            Expr::PathRef(path) => Ok(Operand::Column(self.resolve_column(path, tree, node)?)),
            Expr::Literal(value) => Ok(Operand::Value(value.clone())),
            other => Err(TranslationError::unsupported(format!(
                "comparison operand must be a property path or a literal, got {:?}",
                other
            ))),
        }
    }

    fn compare_value(
        &self,
        column: ColumnRef<'a>,
        op: CompareOp,
        value: Value,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        if value.is_null() {
            return match op {
                CompareOp::Eq => Ok(format!("{} is null", column.sql)),
                CompareOp::Ne => Ok(format!("{} is not null", column.sql)),
                other => Err(TranslationError::unsupported(format!(
                    "operator `{}` cannot compare with null",
                    other.symbol()
                ))),
            };
        }
        let value = self.key_value(column.column, value)?;
        if op == CompareOp::Like && value.as_text().is_none() {
            return Err(TranslationError::unsupported("like requires a text pattern"));
        }
        let placeholder = params.add(value);
        Ok(format!("{} {} {}", column.sql, op.symbol(), placeholder))
    }

    fn membership(
        &self,
        path: &PropertyPath,
        values: &[Value],
        tree: &mut JoinTree,
        node: usize,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        if values.is_empty() {
            // Still a valid path, but nothing can match: no join, no parameter.
            self.registry
                .resolve_path(&tree.node(node).entity, &path.to_string())?;
            return Ok(ALWAYS_FALSE.to_string());
        }
        let column = self.resolve_column(path, tree, node)?;
        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            let value = self.key_value(column.column, value.clone())?;
            placeholders.push(params.add(value));
        }
        Ok(format!("{} in ({})", column.sql, placeholders.join(", ")))
    }

    /// `Any` over a one-to-many collection, as a correlated `exists`.
    fn exists(
        &mut self,
        collection: &PropertyPath,
        predicate: Option<&Expr>,
        tree: &mut JoinTree,
        node: usize,
        params: &mut Parameters,
    ) -> Result<String, TranslationError> {
        let Some(property) = collection.leaf() else {
            return Err(TranslationError::unsupported(
                "any() must be applied to a collection property path",
            ));
        };
        let (owner, owner_map) = self.walk_references(collection.parent().segments(), tree, node)?;
        let column = owner_map.column(property)?;
        if column.is_ignored {
            return Err(MappingError::unknown_property(&owner_map.name, property).into());
        }
        if column.relationship != RelationshipKind::OneToMany {
            return Err(MappingError::NotARelationship {
                entity: owner_map.name.clone(),
                property: property.to_string(),
                expected: "one-to-many",
            }
            .into());
        }
        let child_column = column.child_column(self.registry)?;

        self.subqueries += 1;
        let alias = format!("s{}", self.subqueries);
        let mut subtree = JoinTree::new(self.registry, child_column.entity(), &alias)?;

        let owner_key = self.root_or_alias_sql(tree, owner, owner_map, &owner_map.primary_key().db_name);
        let mut sql = format!(
            "{}.{} = {}",
            alias,
            self.dialect.quote_identifier(&child_column.db_name),
            owner_key
        );
        if let Some(predicate) = predicate {
            let qualify = std::mem::replace(&mut self.qualify, true);
            let inner = self.visit(predicate, &mut subtree, JoinTree::ROOT, params);
            self.qualify = qualify;
            sql.push_str(" and ");
            sql.push_str(&inner?);
        }
        Ok(format!(
            "exists (select 1 from {}{} where {})",
            subtree.root_table_sql(self.dialect),
            subtree.joins_sql(self.dialect),
            sql
        ))
    }

    /// Follows reference segments from `node`, joining as it goes.
    fn walk_references(
        &self,
        segments: &[String],
        tree: &mut JoinTree,
        mut node: usize,
    ) -> Result<(usize, &'a EntityMap), TranslationError> {
        let mut map = self.registry.resolve(&tree.node(node).entity)?;
        for segment in segments {
            let column = self.navigable(map, segment)?;
            let parent = column.parent_map(self.registry)?;
            node = tree.ensure(self.registry, node, segment, false)?;
            map = parent;
        }
        Ok((node, map))
    }

    fn navigable(&self, map: &'a EntityMap, property: &str) -> Result<&'a Column, TranslationError> {
        let column = map.column(property)?;
        if column.is_ignored {
            return Err(MappingError::unknown_property(&map.name, property).into());
        }
        if column.relationship == RelationshipKind::OneToMany {
            return Err(TranslationError::CollectionNavigation {
                entity: map.name.clone(),
                property: property.to_string(),
            });
        }
        Ok(column)
    }

    fn resolve_column(
        &self,
        path: &PropertyPath,
        tree: &mut JoinTree,
        node: usize,
    ) -> Result<ColumnRef<'a>, TranslationError> {
        let segments = path.segments();
        let Some((last, navigation)) = segments.split_last() else {
            return Err(TranslationError::unsupported("empty property path"));
        };

        // `Post.PostId` is the foreign key column itself: no join needed.
        if let Some((reference, prefix)) = navigation.split_last() {
            let (owner, owner_map) = self.walk_references(prefix, tree, node)?;
            let column = self.navigable(owner_map, reference)?;
            if column.is_reference() {
                let parent = column.parent_map(self.registry)?;
                if parent.primary_key().name == *last {
                    return Ok(ColumnRef {
                        sql: self.root_or_alias_sql(tree, owner, owner_map, &column.db_name),
                        column: parent.primary_key(),
                    });
                }
            }
        }

        let (owner, owner_map) = self.walk_references(navigation, tree, node)?;
        let column = self.navigable(owner_map, last)?;
        Ok(ColumnRef {
            sql: self.alias_sql(tree, owner, &column.db_name),
            column,
        })
    }

    fn alias_sql(&self, tree: &JoinTree, node: usize, db_name: &str) -> String {
        if self.qualify || node != JoinTree::ROOT {
            format!("{}.{}", tree.node(node).alias, self.dialect.quote_identifier(db_name))
        } else {
            self.dialect.quote_identifier(db_name)
        }
    }

    /// Like [`Self::alias_sql`], but an unqualified root reference names the table so it
    /// can be correlated from a subquery.
    fn root_or_alias_sql(&self, tree: &JoinTree, node: usize, map: &EntityMap, db_name: &str) -> String {
        if self.qualify || node != JoinTree::ROOT {
            self.alias_sql(tree, node, db_name)
        } else {
            format!(
                "{}.{}",
                self.dialect.quote_table(map),
                self.dialect.quote_identifier(db_name)
            )
        }
    }

    /// The value actually compared: an entity compares by its primary key.
    fn key_value(&self, column: &Column, value: Value) -> Result<Value, TranslationError> {
        match value {
            Value::Entity(record) => {
                if !(column.is_reference() || column.is_primary_key) {
                    return Err(TranslationError::unsupported(format!(
                        "entity `{}` compared with scalar property `{}`",
                        record.entity, column.name
                    )));
                }
                let map = self.registry.resolve(&record.entity)?;
                Ok(record
                    .get(&map.primary_key().name)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            Value::Collection(_) => Err(TranslationError::unsupported(format!(
                "collection value compared with `{}`",
                column.name
            ))),
            other => Ok(other),
        }
    }
}

/// Pushes every NOT down to the leaves (De Morgan). Negations with no leaf form, such
/// as `not like` or `not exists`, stay as NOT over the leaf.
pub fn push_negation(expr: Expr) -> Expr {
    match expr {
        Expr::Not(inner) => negate(*inner),
        Expr::And(left, right) => Expr::And(
            Box::new(push_negation(*left)),
            Box::new(push_negation(*right)),
        ),
        Expr::Or(left, right) => Expr::Or(
            Box::new(push_negation(*left)),
            Box::new(push_negation(*right)),
        ),
        Expr::Any {
            collection,
            predicate,
        } => Expr::Any {
            collection,
            predicate: predicate.map(|p| Box::new(push_negation(*p))),
        },
        other => other,
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Not(inner) => push_negation(*inner),
        Expr::And(left, right) => Expr::Or(Box::new(negate(*left)), Box::new(negate(*right))),
        Expr::Or(left, right) => Expr::And(Box::new(negate(*left)), Box::new(negate(*right))),
        Expr::Compare { left, op, right } => match op.negate() {
            Some(negated) => Expr::Compare {
                left,
                op: negated,
                right,
            },
            None => Expr::Not(Box::new(Expr::Compare { left, op, right })),
        },
        Expr::Literal(Value::Bool(b)) => Expr::Literal(Value::Bool(!b)),
        other => Expr::Not(Box::new(push_negation(other))),
    }
}
