//! Statement writers. Each is a pure function of mapping, dialect and query
//! description to SQL text plus ordered parameters.

pub mod count;
pub mod ddl;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use serde::Serialize;

use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::{Column, EntityMap, MappingRegistry};
use crate::query::{Entity, Expr, Value};
use crate::sql::{JoinTree, Parameters, WhereClauseWriter};

pub use count::CountWriter;
pub use ddl::DdlWriter;
pub use delete::DeleteWriter;
pub use insert::{InsertStatement, InsertWriter};
pub use select::{SelectWriter, SelectWriterResult};
pub use update::UpdateWriter;

/// Alias of the root table in every aliased statement.
pub const ROOT_ALIAS: &str = "t";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlWriterResult {
    pub sql: String,
    pub parameters: Parameters,
}

impl SqlWriterResult {
    pub fn new(sql: String, parameters: Parameters) -> Self {
        SqlWriterResult { sql, parameters }
    }
}

/// The value an entity holds for `column`; references store the referenced key.
pub(crate) fn column_value<E: Entity + ?Sized>(
    registry: &MappingRegistry,
    column: &Column,
    entity: &E,
) -> Result<Value, Error> {
    let value = entity.value(&column.name).unwrap_or(Value::Null);
    reference_key(registry, column, value)
}

/// Replaces an entity value with its primary key when `column` is a reference.
pub(crate) fn reference_key(
    registry: &MappingRegistry,
    column: &Column,
    value: Value,
) -> Result<Value, Error> {
    match value {
        Value::Entity(record) if column.is_reference() => {
            let parent = column.parent_map(registry)?;
            Ok(record
                .get(&parent.primary_key().name)
                .cloned()
                .unwrap_or(Value::Null))
        }
        Value::Entity(_) | Value::Collection(_) => Err(Error::argument(format!(
            "`{}.{}` cannot hold an entity value",
            column.entity(),
            column.name
        ))),
        other => Ok(other),
    }
}

/// The where clause of a single-table update or delete on `map`, with a leading space.
///
/// Predicates that stay on the table are written against it directly. Predicates that
/// navigate relationships filter on `pk in (select t.pk from ... )` instead.
pub(crate) fn where_for_target(
    registry: &MappingRegistry,
    dialect: &dyn SqlDialect,
    map: &EntityMap,
    predicates: &[Expr],
    params: &mut Parameters,
) -> Result<String, Error> {
    if predicates.is_empty() {
        return Ok(String::new());
    }

    let checkpoint = params.clone();
    let mut tree = JoinTree::new(registry, &map.name, ROOT_ALIAS)?;
    let direct = WhereClauseWriter::new(registry, dialect)
        .unqualified()
        .write_all(predicates, &mut tree, params)?
        .unwrap_or_default();
    if !tree.has_joins() {
        return Ok(format!(" where {}", direct));
    }

    *params = checkpoint;
    let mut tree = JoinTree::new(registry, &map.name, ROOT_ALIAS)?;
    let filter = WhereClauseWriter::new(registry, dialect)
        .write_all(predicates, &mut tree, params)?
        .unwrap_or_default();
    let key = dialect.quote_identifier(&map.primary_key().db_name);
    let subquery = format!(
        "select {}.{} from {}{} where {}",
        tree.root_alias(),
        key,
        tree.root_table_sql(dialect),
        tree.joins_sql(dialect),
        filter
    );
    log::trace!("Filtering {} through key subquery", map.name);
    Ok(format!(" where {} in {}", key, dialect.wrap_key_subquery(&subquery)))
}
