use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::errors::MappingError;
use super::registry::MappingRegistry;
use super::EntityMap;

/// Semantic scalar type of a mapped column, independent of any SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbType {
    AnsiString,
    AnsiStringFixedLength,
    Binary,
    Boolean,
    Byte,
    Currency,
    Date,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Object,
    Single,
    String,
    StringFixedLength,
    Time,
    Xml,
}

impl DbType {
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DbType::Byte | DbType::Int16 | DbType::Int32 | DbType::Int64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                DbType::Currency | DbType::Decimal | DbType::Double | DbType::Single
            )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DbType::AnsiString
                | DbType::AnsiStringFixedLength
                | DbType::String
                | DbType::StringFixedLength
                | DbType::Xml
        )
    }

    /// Types that carry a length hint in DDL.
    pub fn takes_length(&self) -> bool {
        matches!(
            self,
            DbType::AnsiString
                | DbType::AnsiStringFixedLength
                | DbType::String
                | DbType::StringFixedLength
                | DbType::Binary
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DbType::Date
                | DbType::DateTime
                | DbType::DateTime2
                | DbType::DateTimeOffset
                | DbType::Time
        )
    }

    /// Reference-like types are nullable unless configured otherwise.
    pub fn nullable_by_default(&self) -> bool {
        self.is_textual() || matches!(self, DbType::Binary | DbType::Object)
    }
}

/// How a column relates to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RelationshipKind {
    #[default]
    None,
    ManyToOne,
    OneToMany,
    OneToOne,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::None => "none",
            RelationshipKind::ManyToOne => "many-to-one",
            RelationshipKind::OneToMany => "one-to-many",
            RelationshipKind::OneToOne => "one-to-one",
        };
        write!(f, "{}", s)
    }
}

/// The declared type of a mapped property.
///
/// A reference property has the type of the entity it points at; its effective
/// database type is the related entity's primary-key type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Scalar(DbType),
    Entity(String),
    Collection(String),
}

/// One mapped property of an entity.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) entity: String,
    pub name: String,
    pub db_name: String,
    pub property_type: PropertyType,
    pub relationship: RelationshipKind,
    /// Effective database type; for references this is the related key's type.
    pub db_type: DbType,
    pub length: Option<u16>,
    pub max_length: bool,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub default: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_auto_generated: bool,
    pub is_ignored: bool,
    pub is_excluded_by_default: bool,
    /// Position of the column in its map's declaration order. Stable for a given
    /// mapping configuration.
    pub fetch_id: usize,
    pub(crate) child_column_name: Option<String>,
    pub(crate) opposite_column_name: Option<String>,
    child_column: OnceLock<String>,
}

impl Column {
    pub(crate) fn new(
        entity: impl Into<String>,
        name: impl Into<String>,
        db_name: impl Into<String>,
        property_type: PropertyType,
        relationship: RelationshipKind,
        db_type: DbType,
    ) -> Self {
        Column {
            entity: entity.into(),
            name: name.into(),
            db_name: db_name.into(),
            property_type,
            relationship,
            db_type,
            length: None,
            max_length: false,
            precision: None,
            scale: None,
            default: None,
            is_nullable: false,
            is_primary_key: false,
            is_auto_generated: false,
            is_ignored: false,
            is_excluded_by_default: false,
            fetch_id: 0,
            child_column_name: None,
            opposite_column_name: None,
            child_column: OnceLock::new(),
        }
    }

    /// Name of the entity that owns this column.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The entity a reference or collection property points at.
    pub fn related_entity(&self) -> Option<&str> {
        match &self.property_type {
            PropertyType::Scalar(_) => None,
            PropertyType::Entity(name) | PropertyType::Collection(name) => Some(name.as_str()),
        }
    }

    /// True when the property is backed by a column of its own table.
    pub fn is_owned(&self) -> bool {
        !self.is_ignored && self.relationship != RelationshipKind::OneToMany
    }

    /// True for many-to-one and one-to-one references (a foreign key on this table).
    pub fn is_reference(&self) -> bool {
        matches!(
            self.relationship,
            RelationshipKind::ManyToOne | RelationshipKind::OneToOne
        )
    }

    /// The map referenced by a many-to-one or one-to-one column.
    pub fn parent_map<'r>(
        &self,
        registry: &'r MappingRegistry,
    ) -> Result<&'r EntityMap, MappingError> {
        match (&self.property_type, self.is_reference()) {
            (PropertyType::Entity(parent), true) => registry.resolve(parent),
            _ => Err(MappingError::NotARelationship {
                entity: self.entity.clone(),
                property: self.name.clone(),
                expected: "many-to-one",
            }),
        }
    }

    /// The column on the child map that points back at this collection's owner.
    ///
    /// Resolved on first access and cached for the lifetime of the column. Concurrent
    /// first accesses may both resolve; they always converge on the same column.
    pub fn child_column<'r>(
        &self,
        registry: &'r MappingRegistry,
    ) -> Result<&'r Column, MappingError> {
        let child = match (&self.property_type, self.relationship) {
            (PropertyType::Collection(child), RelationshipKind::OneToMany) => child,
            _ => {
                return Err(MappingError::NotARelationship {
                    entity: self.entity.clone(),
                    property: self.name.clone(),
                    expected: "one-to-many",
                })
            }
        };
        let child_map = registry.resolve(child)?;

        if let Some(name) = self.child_column.get() {
            return child_map.column(name);
        }

        let resolved = self.resolve_child_column(child_map)?;
        log::trace!(
            "Resolved child column {}.{} -> {}.{}",
            self.entity,
            self.name,
            child_map.name,
            resolved.name
        );
        let name = self.child_column.get_or_init(|| resolved.name.clone());
        child_map.column(name)
    }

    fn resolve_child_column<'m>(&self, child_map: &'m EntityMap) -> Result<&'m Column, MappingError> {
        let points_back = |c: &Column| {
            c.relationship == RelationshipKind::ManyToOne
                && c.property_type == PropertyType::Entity(self.entity.clone())
        };

        if let Some(explicit) = &self.child_column_name {
            let column = child_map.column(explicit)?;
            if !points_back(column) {
                return Err(MappingError::ChildColumnTypeMismatch {
                    parent: self.entity.clone(),
                    collection: self.name.clone(),
                    child: child_map.name.clone(),
                    column: explicit.clone(),
                });
            }
            return Ok(column);
        }

        let candidates: Vec<&Column> = child_map
            .columns()
            .iter()
            .filter(|c| !c.is_ignored && points_back(*c))
            .collect();

        match candidates.as_slice() {
            [single] => Ok(single),
            [] => Err(MappingError::MissingChildColumn {
                parent: self.entity.clone(),
                collection: self.name.clone(),
                child: child_map.name.clone(),
            }),
            many => Err(MappingError::AmbiguousChildColumn {
                parent: self.entity.clone(),
                collection: self.name.clone(),
                child: child_map.name.clone(),
                candidates: many
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// The column on the related map that points back at this one-to-one property,
    /// when an opposite was configured.
    pub fn opposite_column<'r>(
        &self,
        registry: &'r MappingRegistry,
    ) -> Result<Option<&'r Column>, MappingError> {
        if self.relationship != RelationshipKind::OneToOne {
            return Err(MappingError::NotARelationship {
                entity: self.entity.clone(),
                property: self.name.clone(),
                expected: "one-to-one",
            });
        }
        let Some(opposite) = &self.opposite_column_name else {
            return Ok(None);
        };
        let column = self.parent_map(registry)?.column(opposite)?;
        Ok(Some(column))
    }
}
