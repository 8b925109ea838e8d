use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::MappingRegistry;
use crate::query::{DeleteQuery, Entity, Value};
use crate::sql::Parameters;

use super::{column_value, reference_key, where_for_target, SqlWriterResult};

pub struct DeleteWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> DeleteWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        DeleteWriter { registry, dialect }
    }

    /// `delete from [T] where [Key] in (@p_1, ...)`.
    pub fn delete_by_keys(&self, entity: &str, keys: &[Value]) -> Result<SqlWriterResult, Error> {
        if keys.is_empty() {
            return Err(Error::argument("at least one primary key is required to delete"));
        }
        let map = self.registry.resolve(entity)?;
        let key = map.primary_key();

        let mut params = Parameters::new();
        let mut placeholders = Vec::with_capacity(keys.len());
        for value in keys {
            if value.is_null() {
                return Err(Error::argument(format!("null key in delete of {}", map.name)));
            }
            placeholders.push(params.add(reference_key(self.registry, key, value.clone())?));
        }

        let sql = format!(
            "delete from {} where {} in ({})",
            self.dialect.quote_table(map),
            self.dialect.quote_identifier(&key.db_name),
            placeholders.join(", ")
        );
        log::debug!("Delete of {} {} rows by key", keys.len(), map.name);
        Ok(SqlWriterResult::new(sql, params))
    }

    /// Deletes entities of one type by their primary keys.
    pub fn delete_entities<E: Entity>(&self, entities: &[E]) -> Result<SqlWriterResult, Error> {
        let Some(first) = entities.first() else {
            return Err(Error::argument("at least one entity is required to delete"));
        };
        let entity = first.entity_name();
        let map = self.registry.resolve(entity)?;

        let mut keys = Vec::with_capacity(entities.len());
        for item in entities {
            if item.entity_name() != entity {
                return Err(Error::argument(format!(
                    "cannot delete {} and {} in one statement",
                    entity,
                    item.entity_name()
                )));
            }
            keys.push(column_value(self.registry, map.primary_key(), item)?);
        }
        self.delete_by_keys(entity, &keys)
    }

    /// Deletes every row matching the query's predicates.
    pub fn delete(&self, query: &DeleteQuery) -> Result<SqlWriterResult, Error> {
        let map = self.registry.resolve(&query.entity)?;
        let mut params = Parameters::new();
        let filter = where_for_target(self.registry, self.dialect, map, &query.predicates, &mut params)?;
        let sql = format!("delete from {}{}", self.dialect.quote_table(map), filter);
        log::debug!("Delete from {} with {} parameters", map.name, params.len());
        Ok(SqlWriterResult::new(sql, params))
    }
}
