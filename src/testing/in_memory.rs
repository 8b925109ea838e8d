use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::Error;
use crate::mapping::{Column, EntityMap, MappingError, MappingRegistry, RelationshipKind};
use crate::query::{
    CompareOp, DeleteQuery, Direction, Expr, PropertyPath, Record, SelectQuery, UpdateQuery, Value,
};
use crate::sql::{FetchPlan, FetchPlanner, JoinTree, TranslationError};
use crate::writer::update::assignable_column;
use crate::writer::{column_value, reference_key, ROOT_ALIAS};

/// SQL three-valued truth: `None` is UNKNOWN.
type Truth = Option<bool>;

fn and(left: Truth, right: Truth) -> Truth {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(left: Truth, right: Truth) -> Truth {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn same_key(left: &Value, right: &Value) -> bool {
    left.compare(right) == Some(Ordering::Equal)
}

/// `%` and `_` wildcards; matching is case sensitive.
fn like(text: &str, pattern: &str) -> Result<bool, Error> {
    let mut expression = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');
    let regex = Regex::new(&expression)
        .map_err(|e| Error::argument(format!("invalid like pattern `{}`: {}", pattern, e)))?;
    Ok(regex.is_match(text))
}

/// Rows of mapped entities held in memory, queried with the same descriptions the
/// writers translate.
///
/// Predicates evaluate with SQL semantics: comparisons involving NULL are UNKNOWN, rows
/// qualify only when the filter is TRUE, navigation through a missing reference yields
/// NULL, and ascending order puts NULLs first. Database-generated keys count up from 1
/// per entity.
#[derive(Debug, Clone)]
pub struct InMemoryDatabase {
    registry: Arc<MappingRegistry>,
    tables: BTreeMap<String, Vec<Record>>,
}

impl InMemoryDatabase {
    pub fn new(registry: Arc<MappingRegistry>) -> Self {
        InMemoryDatabase {
            registry,
            tables: BTreeMap::new(),
        }
    }

    /// Stored rows of `entity`. References hold the referenced key.
    pub fn rows(&self, entity: &str) -> &[Record] {
        self.tables.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stores `record` and returns its primary key.
    pub fn insert(&mut self, record: &Record) -> Result<Value, Error> {
        let map = self.registry.resolve(&record.entity)?;
        let key = map.primary_key();

        let mut row = Record::new(map.name.clone());
        for column in map.owned_columns() {
            let value = if column.is_auto_generated {
                Value::Null
            } else {
                column_value(&self.registry, column, record)?
            };
            row.set(column.name.clone(), value);
        }

        let rows = self.tables.entry(map.name.clone()).or_default();
        let key_value = if key.is_auto_generated {
            let next = rows
                .iter()
                .filter_map(|r| match r.get(&key.name) {
                    Some(Value::Int(i)) => Some(*i),
                    _ => None,
                })
                .max()
                .unwrap_or(0)
                + 1;
            Value::Int(next)
        } else {
            row.get(&key.name).cloned().unwrap_or(Value::Null)
        };
        if key_value.is_null() {
            return Err(Error::argument(format!(
                "cannot store a {} without a value for `{}`",
                map.name, key.name
            )));
        }
        if rows.iter().any(|r| r.get(&key.name).is_some_and(|k| same_key(k, &key_value))) {
            return Err(Error::argument(format!(
                "duplicate key {:?} for {}",
                key_value, map.name
            )));
        }

        row.set(key.name.clone(), key_value.clone());
        log::trace!("Stored {} {:?}", map.name, key_value);
        rows.push(row);
        Ok(key_value)
    }

    pub fn query(&self, query: &SelectQuery) -> Result<Vec<Record>, Error> {
        if query.take.is_some_and(|take| take < 0) || query.skip.is_some_and(|skip| skip < 0) {
            return Err(Error::argument("take and skip must not be negative"));
        }
        let map = self.registry.resolve(&query.entity)?;
        let mut tree = JoinTree::new(&self.registry, &query.entity, ROOT_ALIAS)?;
        let plan = FetchPlanner::new(&self.registry).plan(query, &mut tree)?;
        if query.is_paged() {
            if let Some(path) = plan.collection_path() {
                return Err(TranslationError::PagingWithCollectionFetch {
                    path: path.to_string(),
                }
                .into());
            }
        }

        let mut matched = Vec::new();
        for row in self.rows(&map.name) {
            if self.matches(&query.predicates, map, row)? {
                matched.push(row);
            }
        }

        let mut order: Vec<(PropertyPath, Direction)> = query
            .order
            .iter()
            .map(|clause| (clause.path.clone(), clause.direction))
            .collect();
        if order.is_empty() && query.is_paged() {
            order.push((PropertyPath::parse(&map.primary_key().name), Direction::Ascending));
        }
        if !order.is_empty() {
            let mut keyed = Vec::with_capacity(matched.len());
            for row in matched {
                let mut keys = Vec::with_capacity(order.len());
                for (path, _) in &order {
                    keys.push(self.path_value(map, row, path)?);
                }
                keyed.push((keys, row));
            }
            keyed.sort_by(|(a, _), (b, _)| {
                for ((left, right), (_, direction)) in a.iter().zip(b).zip(&order) {
                    let ordering = match (left.is_null(), right.is_null()) {
                        (true, true) => Ordering::Equal,
                        (true, false) => Ordering::Less,
                        (false, true) => Ordering::Greater,
                        (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
                    };
                    let ordering = match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
            matched = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let skip = query.skip.unwrap_or(0) as usize;
        let take = query
            .take
            .filter(|take| *take > 0)
            .map(|take| take as usize)
            .unwrap_or(usize::MAX);
        matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| self.materialize(&plan, 0, row))
            .collect()
    }

    pub fn count(&self, query: &SelectQuery) -> Result<usize, Error> {
        let map = self.registry.resolve(&query.entity)?;
        let mut count = 0;
        for row in self.rows(&map.name) {
            if self.matches(&query.predicates, map, row)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Applies the assignments to every matching row; returns the number of rows.
    pub fn update(&mut self, query: &UpdateQuery) -> Result<usize, Error> {
        if query.assignments.is_empty() {
            return Err(Error::argument("an update needs at least one assignment"));
        }
        let registry = Arc::clone(&self.registry);
        let map = registry.resolve(&query.entity)?;
        let mut assignments = Vec::with_capacity(query.assignments.len());
        for (property, value) in &query.assignments {
            let column = assignable_column(map, property)?;
            assignments.push((column.name.clone(), reference_key(&registry, column, value.clone())?));
        }

        let targets = self.matching_positions(map, &query.predicates)?;
        if let Some(rows) = self.tables.get_mut(&map.name) {
            for &position in &targets {
                for (property, value) in &assignments {
                    rows[position].set(property.clone(), value.clone());
                }
            }
        }
        Ok(targets.len())
    }

    /// Writes every updatable column of `record` to the row with the same key.
    pub fn save(&mut self, record: &Record) -> Result<usize, Error> {
        let registry = Arc::clone(&self.registry);
        let map = registry.resolve(&record.entity)?;
        let key = column_value(&registry, map.primary_key(), record)?;
        let mut values = Vec::new();
        for column in map.updatable_columns() {
            values.push((column.name.clone(), column_value(&registry, column, record)?));
        }

        let Some(rows) = self.tables.get_mut(&map.name) else {
            return Ok(0);
        };
        let mut saved = 0;
        for row in rows.iter_mut() {
            if row.get(&map.primary_key().name).is_some_and(|k| same_key(k, &key)) {
                for (property, value) in &values {
                    row.set(property.clone(), value.clone());
                }
                saved += 1;
            }
        }
        Ok(saved)
    }

    /// Removes every matching row; returns the number of rows.
    pub fn delete(&mut self, query: &DeleteQuery) -> Result<usize, Error> {
        let registry = Arc::clone(&self.registry);
        let map = registry.resolve(&query.entity)?;
        let targets = self.matching_positions(map, &query.predicates)?;
        self.remove_positions(&map.name, &targets);
        Ok(targets.len())
    }

    pub fn delete_by_keys(&mut self, entity: &str, keys: &[Value]) -> Result<usize, Error> {
        let registry = Arc::clone(&self.registry);
        let map = registry.resolve(entity)?;
        let key = &map.primary_key().name;
        let targets: Vec<usize> = self
            .rows(&map.name)
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.get(key)
                    .is_some_and(|k| keys.iter().any(|wanted| same_key(k, wanted)))
            })
            .map(|(position, _)| position)
            .collect();
        self.remove_positions(&map.name, &targets);
        Ok(targets.len())
    }

    fn matching_positions(&self, map: &EntityMap, predicates: &[Expr]) -> Result<Vec<usize>, Error> {
        let mut positions = Vec::new();
        for (position, row) in self.rows(&map.name).iter().enumerate() {
            if self.matches(predicates, map, row)? {
                positions.push(position);
            }
        }
        Ok(positions)
    }

    fn remove_positions(&mut self, entity: &str, positions: &[usize]) {
        if let Some(rows) = self.tables.get_mut(entity) {
            let mut position = 0;
            rows.retain(|_| {
                let keep = !positions.contains(&position);
                position += 1;
                keep
            });
        }
    }

    fn matches(&self, predicates: &[Expr], map: &EntityMap, row: &Record) -> Result<bool, Error> {
        for predicate in predicates {
            if self.eval(predicate, map, row)? != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn eval(&self, expr: &Expr, map: &EntityMap, row: &Record) -> Result<Truth, Error> {
        match expr {
            Expr::And(left, right) => Ok(and(self.eval(left, map, row)?, self.eval(right, map, row)?)),
            Expr::Or(left, right) => Ok(or(self.eval(left, map, row)?, self.eval(right, map, row)?)),
            Expr::Not(inner) => Ok(self.eval(inner, map, row)?.map(|b| !b)),
            Expr::Compare { left, op, right } => self.compare(left, *op, right, map, row),
            Expr::In { path, values } => {
                if values.is_empty() {
                    self.path_value(map, row, path)?;
                    return Ok(Some(false));
                }
                let value = self.path_value(map, row, path)?;
                if value.is_null() {
                    return Ok(None);
                }
                let mut unknown = false;
                for candidate in values {
                    let candidate = self.literal_value(candidate)?;
                    if candidate.is_null() {
                        unknown = true;
                    } else if same_key(&value, &candidate) {
                        return Ok(Some(true));
                    }
                }
                Ok(if unknown { None } else { Some(false) })
            }
            Expr::Any {
                collection,
                predicate,
            } => self.any(collection, predicate.as_deref(), map, row),
            Expr::PathRef(path) => match self.path_value(map, row, path)? {
                Value::Bool(b) => Ok(Some(b)),
                Value::Null => Ok(None),
                _ => Err(TranslationError::unsupported(format!("`{}` is not a boolean property", path)).into()),
            },
            Expr::Literal(Value::Bool(b)) => Ok(Some(*b)),
            Expr::Literal(other) => {
                Err(TranslationError::unsupported(format!("literal {:?} used as a predicate", other)).into())
            }
        }
    }

    fn compare(
        &self,
        left: &Expr,
        op: CompareOp,
        right: &Expr,
        map: &EntityMap,
        row: &Record,
    ) -> Result<Truth, Error> {
        let null_literal = |e: &Expr| matches!(e, Expr::Literal(Value::Null));
        if null_literal(left) || null_literal(right) {
            let other = if null_literal(left) { right } else { left };
            let is_null = self.operand(other, map, row)?.is_null();
            return match op {
                CompareOp::Eq => Ok(Some(is_null)),
                CompareOp::Ne => Ok(Some(!is_null)),
                _ => Err(TranslationError::unsupported(format!(
                    "`{}` cannot compare with null",
                    op.symbol()
                ))
                .into()),
            };
        }

        let left = self.operand(left, map, row)?;
        let right = self.operand(right, map, row)?;
        if left.is_null() || right.is_null() {
            return Ok(None);
        }
        if op == CompareOp::Like {
            return match (left.as_text(), right.as_text()) {
                (Some(text), Some(pattern)) => Ok(Some(like(text, pattern)?)),
                _ => Err(TranslationError::unsupported("like requires text operands").into()),
            };
        }
        let Some(ordering) = left.compare(&right) else {
            return Err(Error::argument(format!("cannot compare {:?} with {:?}", left, right)));
        };
        Ok(Some(match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Like => false,
        }))
    }

    fn operand(&self, expr: &Expr, map: &EntityMap, row: &Record) -> Result<Value, Error> {
        match expr {
            Expr::PathRef(path) => self.path_value(map, row, path),
            Expr::Literal(value) => self.literal_value(value),
            other => Err(TranslationError::unsupported(format!("{:?} used as a comparison operand", other)).into()),
        }
    }

    /// Entity literals stand for their primary key.
    fn literal_value(&self, value: &Value) -> Result<Value, Error> {
        match value {
            Value::Entity(record) => {
                let map = self.registry.resolve(&record.entity)?;
                Ok(record.get(&map.primary_key().name).cloned().unwrap_or(Value::Null))
            }
            other => Ok(other.clone()),
        }
    }

    fn any(
        &self,
        collection: &PropertyPath,
        predicate: Option<&Expr>,
        map: &EntityMap,
        row: &Record,
    ) -> Result<Truth, Error> {
        let Some(property) = collection.leaf() else {
            return Err(TranslationError::unsupported("any() must be applied to a collection property path").into());
        };
        let Some((owner_map, owner)) = self.walk(map, row, collection.parent().segments())? else {
            return Ok(Some(false));
        };
        let column = owner_map.column(property)?;
        if column.relationship != RelationshipKind::OneToMany {
            return Err(MappingError::NotARelationship {
                entity: owner_map.name.clone(),
                property: property.to_string(),
                expected: "one-to-many",
            }
            .into());
        }
        let child_column = column.child_column(&self.registry)?;
        let child_map = self.registry.resolve(child_column.entity())?;
        let owner_key = owner.get(&owner_map.primary_key().name).cloned().unwrap_or(Value::Null);

        for child in self.rows(&child_map.name) {
            let belongs = child
                .get(&child_column.name)
                .is_some_and(|k| same_key(k, &owner_key));
            if !belongs {
                continue;
            }
            let satisfied = match predicate {
                Some(predicate) => self.eval(predicate, child_map, child)? == Some(true),
                None => true,
            };
            if satisfied {
                return Ok(Some(true));
            }
        }
        Ok(Some(false))
    }

    /// Follows reference segments; `None` when a reference along the way is missing.
    fn walk<'s>(
        &'s self,
        map: &'s EntityMap,
        row: &'s Record,
        segments: &[String],
    ) -> Result<Option<(&'s EntityMap, &'s Record)>, Error> {
        let mut current = (map, row);
        for segment in segments {
            let (map, row) = current;
            let column = self.navigable(map, segment)?;
            match self.related_row(column, row)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn navigable<'m>(&self, map: &'m EntityMap, property: &str) -> Result<&'m Column, Error> {
        let column = map.column(property)?;
        if column.is_ignored {
            return Err(MappingError::unknown_property(&map.name, property).into());
        }
        if column.relationship == RelationshipKind::OneToMany {
            return Err(TranslationError::CollectionNavigation {
                entity: map.name.clone(),
                property: property.to_string(),
            }
            .into());
        }
        Ok(column)
    }

    fn related_row<'s>(
        &'s self,
        column: &Column,
        row: &Record,
    ) -> Result<Option<(&'s EntityMap, &'s Record)>, Error> {
        let parent = column.parent_map(&self.registry)?;
        let Some(key) = row.get(&column.name).filter(|k| !k.is_null()) else {
            return Ok(None);
        };
        let key_name = &parent.primary_key().name;
        Ok(self
            .rows(&parent.name)
            .iter()
            .find(|r| r.get(key_name).is_some_and(|k| same_key(k, key)))
            .map(|r| (parent, r)))
    }

    fn path_value(&self, map: &EntityMap, row: &Record, path: &PropertyPath) -> Result<Value, Error> {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            return Err(TranslationError::unsupported("empty property path").into());
        };
        let Some((map, row)) = self.walk(map, row, parents)? else {
            return Ok(Value::Null);
        };
        let column = self.navigable(map, last)?;
        Ok(row.get(&column.name).cloned().unwrap_or(Value::Null))
    }

    /// Builds the result record for `row` the way a translated select would return it.
    fn materialize(&self, plan: &FetchPlan, segment: usize, row: &Record) -> Result<Record, Error> {
        let current = &plan.segments[segment];
        let map = self.registry.resolve(&current.entity)?;
        let mut record = Record::new(current.entity.clone());
        for column in &current.columns {
            let value = row.get(&column.property).cloned().unwrap_or(Value::Null);
            let value = match &column.reference {
                Some((entity, key)) if !value.is_null() => {
                    Value::Entity(Box::new(Record::new(entity.clone()).with(key.clone(), value)))
                }
                _ => value,
            };
            record.set(column.property.clone(), value);
        }

        for (index, child) in plan.segments.iter().enumerate() {
            if child.parent != Some(segment) {
                continue;
            }
            let Some(property) = &child.property else {
                continue;
            };
            let column = map.column(property)?;
            if child.relationship == RelationshipKind::OneToMany {
                let child_column = column.child_column(&self.registry)?;
                let key = row.get(&map.primary_key().name).cloned().unwrap_or(Value::Null);
                let mut children = Vec::new();
                for candidate in self.rows(&child.entity) {
                    if candidate
                        .get(&child_column.name)
                        .is_some_and(|k| same_key(k, &key))
                    {
                        children.push(self.materialize(plan, index, candidate)?);
                    }
                }
                record.set(property.clone(), Value::Collection(children));
            } else if let Some((_, target)) = self.related_row(column, row)? {
                record.set(property.clone(), Value::Entity(Box::new(self.materialize(plan, index, target)?)));
            }
        }
        Ok(record)
    }
}
