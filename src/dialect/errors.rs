use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DialectError {
    #[error("There is no {dialect} way of {operation}")]
    Unsupported {
        dialect: &'static str,
        operation: &'static str,
    },

    #[error("Cannot apply paging to a statement that is not a select: {0}")]
    NotASelect(String),

    #[error("Unknown dialect `{0}` (expected ansi, sqlserver or mysql)")]
    UnknownDialect(String),
}

impl DialectError {
    pub fn unsupported(dialect: &'static str, operation: &'static str) -> Self {
        DialectError::Unsupported { dialect, operation }
    }
}
