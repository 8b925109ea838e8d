use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::{Column, EntityMap, MappingRegistry};

/// Schema scripts for a whole registry, plus single-column changes.
pub struct DdlWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> DdlWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        DdlWriter { registry, dialect }
    }

    /// Every table, then every foreign key, then every index, in entity name order.
    pub fn create_script(&self) -> Result<Vec<String>, Error> {
        let mut statements: Vec<String> = self
            .registry
            .maps()
            .map(|map| self.dialect.create_table(map))
            .collect();

        for foreign_key in self.registry.foreign_keys() {
            let child = self.registry.resolve(&foreign_key.child_entity)?;
            let column = child.column(&foreign_key.child_property)?;
            let parent = self.registry.resolve(&foreign_key.parent_entity)?;
            statements.push(self.dialect.create_foreign_key(&foreign_key, child, column, parent));
        }

        for map in self.registry.maps() {
            for index in &map.indexes {
                statements.push(self.dialect.create_index(map, index));
            }
        }

        log::debug!("{} create script: {} statements", self.dialect.name(), statements.len());
        Ok(statements)
    }

    /// Foreign keys first so tables can be dropped in any order.
    pub fn drop_script(&self) -> Result<Vec<String>, Error> {
        let mut statements = Vec::new();
        for foreign_key in self.registry.foreign_keys() {
            let child = self.registry.resolve(&foreign_key.child_entity)?;
            statements.push(self.dialect.drop_foreign_key(&foreign_key, child)?);
        }
        statements.extend(self.registry.maps().map(|map| self.dialect.drop_table(map)));
        Ok(statements)
    }

    pub fn add_column(&self, entity: &str, property: &str) -> Result<String, Error> {
        let (map, column) = self.stored_column(entity, property)?;
        Ok(self.dialect.add_column(map, column))
    }

    /// The drop, preceded by whatever the dialect must run first.
    pub fn drop_column(&self, entity: &str, property: &str) -> Result<Vec<String>, Error> {
        let (map, column) = self.stored_column(entity, property)?;
        let mut statements: Vec<String> = self.dialect.on_before_drop_column(map, column).into_iter().collect();
        statements.push(self.dialect.drop_column(map, column));
        Ok(statements)
    }

    fn stored_column(&self, entity: &str, property: &str) -> Result<(&'a EntityMap, &'a Column), Error> {
        let map = self.registry.resolve(entity)?;
        let column = map.column(property)?;
        if !column.is_owned() {
            return Err(Error::argument(format!(
                "`{}.{}` is not stored in {}",
                entity, property, map.table
            )));
        }
        Ok((map, column))
    }
}
