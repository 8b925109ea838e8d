//! # Mapping Error Types
//!
//! Errors raised while building or resolving entity mapping metadata.
//!
//! ## Error Categories
//!
//! - **Lookup Errors**: unknown entities or property paths
//! - **Relationship Errors**: ambiguous, missing or mistyped back-references
//! - **Definition Errors**: conflicting column attributes, bad identifiers
//! - **Configuration Errors**: file I/O and YAML parsing of mapping definitions
//!
//! All of these are configuration errors: they are fatal and are reported as early as
//! possible, normally when the [`MappingRegistry`](super::MappingRegistry) is built.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MappingError {
    #[error("No mapping registered for entity `{entity}`")]
    UnknownEntity { entity: String },

    #[error("Entity `{entity}` has no mapped property `{property}`")]
    UnknownProperty { entity: String, property: String },

    #[error(
        "The child type `{child}` has more than one property of type `{parent}` ({candidates}). \
         Use `maps_to` on `{parent}.{collection}` to specify which property the collection maps to"
    )]
    AmbiguousChildColumn {
        parent: String,
        collection: String,
        child: String,
        candidates: String,
    },

    #[error(
        "All one-to-many collections must be directional: add a property of type `{parent}` \
         to the child type `{child}` (required by `{parent}.{collection}`)"
    )]
    MissingChildColumn {
        parent: String,
        collection: String,
        child: String,
    },

    #[error(
        "Collection `{parent}.{collection}` maps to `{child}.{column}`, which is not a reference to `{parent}`"
    )]
    ChildColumnTypeMismatch {
        parent: String,
        collection: String,
        child: String,
        column: String,
    },

    #[error("One-to-one property `{entity}.{property}` names opposite `{opposite}`, which does not point back")]
    OppositeColumnMismatch {
        entity: String,
        property: String,
        opposite: String,
    },

    #[error("Conflicting attributes on `{entity}.{property}`: {reason}")]
    ConflictingAttributes {
        entity: String,
        property: String,
        reason: String,
    },

    #[error("Entity `{entity}` maps the name `{name}` more than once")]
    DuplicateColumn { entity: String, name: String },

    #[error("Entity `{entity}` has no primary key column `{column}`")]
    MissingPrimaryKey { entity: String, column: String },

    #[error("Entity `{entity}` declares more than one primary key ({columns})")]
    MultiplePrimaryKeys { entity: String, columns: String },

    #[error("Entity `{entity}` is registered more than once")]
    DuplicateEntity { entity: String },

    #[error("`{entity}.{property}` is not a {expected} relationship")]
    NotARelationship {
        entity: String,
        property: String,
        expected: &'static str,
    },

    #[error("Invalid identifier `{identifier}` in {context}")]
    InvalidIdentifier { identifier: String, context: String },

    #[error("Invalid property definition `{entity}.{property}`: {message}")]
    InvalidDefinition {
        entity: String,
        property: String,
        message: String,
    },

    #[error("Failed to read mapping file: {error}")]
    ConfigReadError { error: String },

    #[error("Failed to parse mapping definition: {error}")]
    ConfigParseError { error: String },
}

impl MappingError {
    pub fn unknown_property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        MappingError::UnknownProperty {
            entity: entity.into(),
            property: property.into(),
        }
    }

    pub fn conflicting(
        entity: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MappingError::ConflictingAttributes {
            entity: entity.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_definition(
        entity: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MappingError::InvalidDefinition {
            entity: entity.into(),
            property: property.into(),
            message: message.into(),
        }
    }
}
