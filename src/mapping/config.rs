//! Declarative mapping definitions.
//!
//! Entities are described either in code with the builder methods below or in YAML:
//!
//! ```yaml
//! entities:
//!   - name: Post
//!     table: Posts              # optional, defaults to the plural of the name
//!     primary_key: PostId       # optional, defaults to <Name>Id
//!     properties:
//!       - name: PostId
//!         type: int32
//!       - name: Title
//!         type: string
//!         length: 200
//!       - name: Author          # many-to-one, stored in AuthorId
//!         references: User
//!       - name: Comments        # one-to-many, back-reference found by type
//!         collection_of: Comment
//!     indexes:
//!       - columns: [Title]
//!         unique: true
//! ```
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::column::DbType;
use super::errors::MappingError;

/// A complete mapping configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: EntityDefinition) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, MappingError> {
        serde_yaml::from_str(content).map_err(|e| MappingError::ConfigParseError {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| MappingError::ConfigReadError {
            error: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Definition of one mapped entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    /// Name of the primary-key property (defaults to `<Name>Id`)
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Whether the database generates the key (defaults to the convention for
    /// integral keys, never for other key types)
    #[serde(default)]
    pub auto_generated_key: Option<bool>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDefinition {
            name: name.into(),
            table: None,
            schema: None,
            primary_key: None,
            auto_generated_key: None,
            properties: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declares the primary-key property.
    pub fn key(mut self, name: impl Into<String>, db_type: DbType) -> Self {
        let name = name.into();
        self.primary_key = Some(name.clone());
        self.properties.push(PropertyDefinition::scalar(name, db_type));
        self
    }

    pub fn auto_generated_key(mut self, generated: bool) -> Self {
        self.auto_generated_key = Some(generated);
        self
    }

    pub fn property(self, name: impl Into<String>, db_type: DbType) -> Self {
        self.with(PropertyDefinition::scalar(name, db_type))
    }

    /// Many-to-one reference to `entity`.
    pub fn reference(self, name: impl Into<String>, entity: impl Into<String>) -> Self {
        self.with(PropertyDefinition::reference(name, entity))
    }

    /// One-to-many collection of `entity`.
    pub fn collection(self, name: impl Into<String>, entity: impl Into<String>) -> Self {
        self.with(PropertyDefinition::collection(name, entity))
    }

    pub fn with(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn index(mut self, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexDefinition {
            name: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        });
        self
    }
}

/// Definition of one property. Exactly one of `type`, `references`, `one_to_one`
/// and `collection_of` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default, rename = "type")]
    pub db_type: Option<DbType>,
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub one_to_one: Option<String>,
    #[serde(default)]
    pub collection_of: Option<String>,
    /// Database column name (defaults to the property name, or `<Name>Id` for references)
    #[serde(default)]
    pub column: Option<String>,
    /// Child property a collection maps to, when it cannot be found by type
    #[serde(default)]
    pub maps_to: Option<String>,
    /// Property on the related entity that points back at a one-to-one reference
    #[serde(default)]
    pub opposite: Option<String>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub length: Option<u16>,
    #[serde(default)]
    pub max_length: bool,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub excluded_by_default: bool,
}

impl PropertyDefinition {
    pub fn scalar(name: impl Into<String>, db_type: DbType) -> Self {
        PropertyDefinition {
            name: name.into(),
            db_type: Some(db_type),
            ..Default::default()
        }
    }

    pub fn reference(name: impl Into<String>, entity: impl Into<String>) -> Self {
        PropertyDefinition {
            name: name.into(),
            references: Some(entity.into()),
            ..Default::default()
        }
    }

    pub fn one_to_one(name: impl Into<String>, entity: impl Into<String>) -> Self {
        PropertyDefinition {
            name: name.into(),
            one_to_one: Some(entity.into()),
            ..Default::default()
        }
    }

    pub fn collection(name: impl Into<String>, entity: impl Into<String>) -> Self {
        PropertyDefinition {
            name: name.into(),
            collection_of: Some(entity.into()),
            ..Default::default()
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn maps_to(mut self, property: impl Into<String>) -> Self {
        self.maps_to = Some(property.into());
        self
    }

    pub fn opposite(mut self, property: impl Into<String>) -> Self {
        self.opposite = Some(property.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn length(mut self, length: u16) -> Self {
        self.length = Some(length);
        self
    }

    pub fn max_length(mut self) -> Self {
        self.max_length = true;
        self
    }

    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn excluded_by_default(mut self) -> Self {
        self.excluded_by_default = true;
        self
    }
}

/// Index declared on an entity, by property name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}
