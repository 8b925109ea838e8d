use thiserror::Error;

use crate::dialect::DialectError;
use crate::mapping::MappingError;

/// Per-call translation failures. A failed translation never yields partial SQL.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Dialect(#[from] DialectError),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Cannot navigate through collection `{entity}.{property}`; use any() to filter on it")]
    CollectionNavigation { entity: String, property: String },

    #[error("Invalid fetch of `{path}`: {reason}")]
    InvalidFetch { path: String, reason: String },

    #[error("Invalid then_fetch(`{path}`): {reason}")]
    InvalidFetchChain { path: String, reason: String },

    #[error("Paging cannot be combined with a collection fetch (`{path}`)")]
    PagingWithCollectionFetch { path: String },

    #[error("Cannot assign `{entity}.{property}`: {reason}")]
    InvalidAssignment {
        entity: String,
        property: String,
        reason: String,
    },

    #[error("Result row has {actual} columns, expected {expected}")]
    MalformedRow { expected: usize, actual: usize },
}

impl TranslationError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        TranslationError::UnsupportedExpression(message.into())
    }

    pub fn invalid_fetch(path: impl ToString, reason: impl Into<String>) -> Self {
        TranslationError::InvalidFetch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
