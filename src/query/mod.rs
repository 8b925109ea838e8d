//! The typed query surface: predicate AST, literal values and query descriptions.

pub mod expr;
pub mod select_query;
pub mod value;

pub use expr::{literal, path, CompareOp, Expr, PropertyPath};
pub use select_query::{
    DeleteQuery, Direction, FetchDirective, FetchKind, OrderClause, SelectQuery, UpdateQuery,
};
pub use value::{Entity, Record, Value};
