//! Entry point tying a mapping registry to a dialect.
//!
//! An [`Engine`] is immutable once built and can be shared across threads; every
//! translation call works on its own state and returns text plus parameters without
//! touching a database.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::{EntityMap, MappingConfig, MappingRegistry};
use crate::query::{DeleteQuery, Entity, SelectQuery, UpdateQuery, Value};
use crate::writer::{
    CountWriter, DdlWriter, DeleteWriter, InsertStatement, InsertWriter, SelectWriter,
    SelectWriterResult, SqlWriterResult, UpdateWriter,
};

#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<MappingRegistry>,
    dialect: Arc<dyn SqlDialect>,
}

impl Engine {
    pub fn new(registry: MappingRegistry, dialect: Arc<dyn SqlDialect>) -> Self {
        Engine {
            registry: Arc::new(registry),
            dialect,
        }
    }

    /// Builds the registry from `mapping` with the conventions in `config`.
    pub fn from_config(config: &EngineConfig, mapping: &MappingConfig) -> Result<Self, Error> {
        let registry = MappingRegistry::build(mapping, &config.convention())?;
        log::debug!(
            "Engine ready: {} dialect, mapping {}",
            config.dialect,
            registry.fingerprint()
        );
        Ok(Self::new(registry, config.dialect()))
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<MappingRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn describe_entity(&self, entity: &str) -> Result<&EntityMap, Error> {
        Ok(self.registry.resolve(entity)?)
    }

    pub fn fingerprint(&self) -> String {
        self.registry.fingerprint()
    }

    pub fn translate_select(&self, query: &SelectQuery) -> Result<SelectWriterResult, Error> {
        SelectWriter::new(&self.registry, self.dialect()).generate(query)
    }

    pub fn translate_count(&self, query: &SelectQuery) -> Result<SqlWriterResult, Error> {
        CountWriter::new(&self.registry, self.dialect()).generate(query)
    }

    pub fn translate_insert<E: Entity>(&self, entities: &[E]) -> Result<Vec<InsertStatement>, Error> {
        InsertWriter::new(&self.registry, self.dialect()).generate(entities)
    }

    pub fn translate_save<E: Entity>(&self, entities: &[E]) -> Result<SqlWriterResult, Error> {
        UpdateWriter::new(&self.registry, self.dialect()).save(entities)
    }

    pub fn translate_update(&self, query: &UpdateQuery) -> Result<SqlWriterResult, Error> {
        UpdateWriter::new(&self.registry, self.dialect()).update(query)
    }

    pub fn translate_delete(&self, query: &DeleteQuery) -> Result<SqlWriterResult, Error> {
        DeleteWriter::new(&self.registry, self.dialect()).delete(query)
    }

    pub fn translate_delete_by_keys(&self, entity: &str, keys: &[Value]) -> Result<SqlWriterResult, Error> {
        DeleteWriter::new(&self.registry, self.dialect()).delete_by_keys(entity, keys)
    }

    pub fn translate_delete_entities<E: Entity>(&self, entities: &[E]) -> Result<SqlWriterResult, Error> {
        DeleteWriter::new(&self.registry, self.dialect()).delete_entities(entities)
    }

    pub fn create_script(&self) -> Result<Vec<String>, Error> {
        DdlWriter::new(&self.registry, self.dialect()).create_script()
    }

    pub fn drop_script(&self) -> Result<Vec<String>, Error> {
        DdlWriter::new(&self.registry, self.dialect()).drop_script()
    }

    pub fn check_database_exists(&self, database: &str) -> Result<String, Error> {
        Ok(self.dialect.check_database_exists(database)?)
    }
}
