use serde::Serialize;

use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::MappingRegistry;
use crate::query::{Entity, Value};
use crate::sql::Parameters;

use super::column_value;

/// One translated insert. `id_sql` is set when the database generates the key; run
/// it on the same connection right after `sql` and hand the result to
/// [`InsertStatement::assign_generated_key`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub sql: String,
    pub parameters: Parameters,
    pub id_sql: Option<String>,
    pub key_property: Option<String>,
}

impl InsertStatement {
    pub fn assign_generated_key<E: Entity + ?Sized>(&self, entity: &mut E, key: Value) {
        if let Some(property) = &self.key_property {
            entity.set_value(property, key);
        }
    }
}

pub struct InsertWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> InsertWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        InsertWriter { registry, dialect }
    }

    /// One statement per entity, in input order.
    pub fn generate<E: Entity>(&self, entities: &[E]) -> Result<Vec<InsertStatement>, Error> {
        if entities.is_empty() {
            return Err(Error::argument("at least one entity is required to insert"));
        }
        entities.iter().map(|entity| self.generate_one(entity)).collect()
    }

    pub fn generate_one<E: Entity + ?Sized>(&self, entity: &E) -> Result<InsertStatement, Error> {
        let map = self.registry.resolve(entity.entity_name())?;
        let mut params = Parameters::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for column in map.insertable_columns() {
            let value = column_value(self.registry, column, entity)?;
            columns.push(self.dialect.quote_identifier(&column.db_name));
            placeholders.push(params.add(value));
        }

        let table = self.dialect.quote_table(map);
        let sql = if columns.is_empty() {
            format!("insert into {} default values", table)
        } else {
            format!(
                "insert into {} ({}) values ({})",
                table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let (id_sql, key_property) = if map.is_primary_key_auto_generated() {
            (
                Some(self.dialect.id_sql()?),
                Some(map.primary_key().name.clone()),
            )
        } else {
            (None, None)
        };

        log::debug!("Insert into {} with {} parameters", map.name, params.len());
        Ok(InsertStatement {
            sql,
            parameters: params,
            id_sql,
            key_property,
        })
    }
}
