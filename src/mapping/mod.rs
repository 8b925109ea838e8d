//! Entity mapping metadata: how each entity's properties correspond to columns and
//! relationships.

pub mod column;
pub mod config;
pub mod convention;
pub mod entity_map;
pub mod errors;
pub mod registry;
pub mod schema;

pub use column::{Column, DbType, PropertyType, RelationshipKind};
pub use config::{EntityDefinition, IndexDefinition, MappingConfig, PropertyDefinition};
pub use convention::Convention;
pub use entity_map::EntityMap;
pub use errors::MappingError;
pub use registry::MappingRegistry;
pub use schema::{ForeignKey, Index};
