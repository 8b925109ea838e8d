//! Tessera - typed query translation for mapped relational entities
//!
//! This crate turns typed query descriptions into dialect-specific SQL through:
//! - Entity mapping metadata (tables, columns, relationships, indexes)
//! - Predicate translation with property-path navigation
//! - Fetch planning and result reassembly
//! - Select, insert, update, delete, count and DDL writers

pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod query;
pub mod sql;
pub mod testing;
pub mod writer;

pub use config::{ConfigError, EngineConfig};
pub use dialect::{DialectKind, SqlDialect};
pub use engine::Engine;
pub use error::Error;
pub use mapping::{MappingConfig, MappingRegistry};
pub use query::{path, DeleteQuery, Record, SelectQuery, UpdateQuery, Value};
