use serde::{Deserialize, Serialize};

use super::expr::{Expr, PropertyPath};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClause {
    pub path: PropertyPath,
    pub direction: Direction,
}

/// How a fetch directive is chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchKind {
    /// Reference path from the root: every segment is many-to-one or one-to-one
    Fetch,
    /// Path from the root whose last segment is a one-to-many collection
    FetchMany,
    /// Path relative to the entity reached by the preceding directive
    ThenFetch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchDirective {
    pub kind: FetchKind,
    pub path: PropertyPath,
}

/// A typed select description: the entity, its filter, ordering, eager-load graph and
/// paging.
///
/// Ordering calls compose left to right: the first `order_by`/`order_by_descending`
/// call is the primary sort key, each later call breaks ties of the ones before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub entity: String,
    pub predicates: Vec<Expr>,
    pub order: Vec<OrderClause>,
    pub fetches: Vec<FetchDirective>,
    pub includes: Vec<PropertyPath>,
    pub excludes: Vec<PropertyPath>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
    pub for_update: bool,
}

impl SelectQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        SelectQuery {
            entity: entity.into(),
            predicates: Vec::new(),
            order: Vec::new(),
            fetches: Vec::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
            take: None,
            skip: None,
            for_update: false,
        }
    }

    /// Adds a predicate; multiple predicates are AND-combined.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, path: &str) -> Self {
        self.order.push(OrderClause {
            path: PropertyPath::parse(path),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_by_descending(mut self, path: &str) -> Self {
        self.order.push(OrderClause {
            path: PropertyPath::parse(path),
            direction: Direction::Descending,
        });
        self
    }

    pub fn fetch(self, path: &str) -> Self {
        self.push_fetch(FetchKind::Fetch, path)
    }

    pub fn fetch_many(self, path: &str) -> Self {
        self.push_fetch(FetchKind::FetchMany, path)
    }

    pub fn then_fetch(self, path: &str) -> Self {
        self.push_fetch(FetchKind::ThenFetch, path)
    }

    fn push_fetch(mut self, kind: FetchKind, path: &str) -> Self {
        self.fetches.push(FetchDirective {
            kind,
            path: PropertyPath::parse(path),
        });
        self
    }

    /// Selects a column that is excluded by default. The path's entity must be the
    /// root or a fetched relationship.
    pub fn include(mut self, path: &str) -> Self {
        self.includes.push(PropertyPath::parse(path));
        self
    }

    /// Leaves a column out of the projection. Primary keys are always selected.
    pub fn exclude(mut self, path: &str) -> Self {
        self.excludes.push(PropertyPath::parse(path));
        self
    }

    pub fn take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    pub fn is_paged(&self) -> bool {
        self.take.is_some() || self.skip.is_some()
    }
}

/// Server-side update: assignments applied to every row matching the predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    pub entity: String,
    pub assignments: Vec<(String, Value)>,
    pub predicates: Vec<Expr>,
}

impl UpdateQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        UpdateQuery {
            entity: entity.into(),
            assignments: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((property.into(), value.into()));
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// Server-side delete of every row matching the predicates (all rows when empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub entity: String,
    pub predicates: Vec<Expr>,
}

impl DeleteQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        DeleteQuery {
            entity: entity.into(),
            predicates: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }
}
