use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::{Column, EntityMap, MappingRegistry, RelationshipKind};
use crate::query::{Entity, UpdateQuery};
use crate::sql::{Parameters, TranslationError};

use super::{column_value, reference_key, where_for_target, SqlWriterResult};

/// The column `property` assigns in an update, if it may be assigned at all.
pub(crate) fn assignable_column<'m>(
    map: &'m EntityMap,
    property: &str,
) -> Result<&'m Column, TranslationError> {
    let column = map.column(property)?;
    let reason = if column.is_ignored {
        Some("the property is not mapped to a column")
    } else if column.relationship == RelationshipKind::OneToMany {
        Some("collections are not stored on the owning row")
    } else if column.is_primary_key {
        Some("primary keys cannot be updated")
    } else if column.is_auto_generated {
        Some("the column is generated by the database")
    } else if !column.is_owned() {
        Some("the column is stored on the other side of the relationship")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TranslationError::InvalidAssignment {
            entity: map.name.clone(),
            property: property.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(column),
    }
}

pub struct UpdateWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> UpdateWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        UpdateWriter { registry, dialect }
    }

    /// Writes every updatable column of each entity back to its row, matched by
    /// primary key. Statements are joined with `; ` and share one parameter list.
    pub fn save<E: Entity>(&self, entities: &[E]) -> Result<SqlWriterResult, Error> {
        if entities.is_empty() {
            return Err(Error::argument("at least one entity is required to save"));
        }

        let mut params = Parameters::new();
        let mut statements = Vec::with_capacity(entities.len());
        for entity in entities {
            let map = self.registry.resolve(entity.entity_name())?;
            let key = map.primary_key();
            let key_value = column_value(self.registry, key, entity)?;
            if key_value.is_null() {
                return Err(Error::argument(format!(
                    "cannot save a {} without a value for `{}`",
                    map.name, key.name
                )));
            }

            let mut assignments = Vec::new();
            for column in map.updatable_columns() {
                let value = column_value(self.registry, column, entity)?;
                assignments.push(format!(
                    "{} = {}",
                    self.dialect.quote_identifier(&column.db_name),
                    params.add(value)
                ));
            }
            if assignments.is_empty() {
                return Err(Error::argument(format!("{} has no updatable columns", map.name)));
            }

            statements.push(format!(
                "update {} set {} where {} = {}",
                self.dialect.quote_table(map),
                assignments.join(", "),
                self.dialect.quote_identifier(&key.db_name),
                params.add(key_value)
            ));
        }

        log::debug!("Save of {} entities with {} parameters", statements.len(), params.len());
        Ok(SqlWriterResult::new(statements.join("; "), params))
    }

    /// Applies the query's assignments to every matching row.
    pub fn update(&self, query: &UpdateQuery) -> Result<SqlWriterResult, Error> {
        if query.assignments.is_empty() {
            return Err(Error::argument("an update needs at least one assignment"));
        }
        let map = self.registry.resolve(&query.entity)?;

        let mut params = Parameters::new();
        let mut assignments = Vec::with_capacity(query.assignments.len());
        for (property, value) in &query.assignments {
            let column = assignable_column(map, property)?;
            let value = reference_key(self.registry, column, value.clone())?;
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote_identifier(&column.db_name),
                params.add(value)
            ));
        }

        let filter = where_for_target(self.registry, self.dialect, map, &query.predicates, &mut params)?;
        let sql = format!(
            "update {} set {}{}",
            self.dialect.quote_table(map),
            assignments.join(", "),
            filter
        );
        log::debug!("Update of {} with {} parameters", map.name, params.len());
        Ok(SqlWriterResult::new(sql, params))
    }
}
