use thiserror::Error;

use crate::dialect::DialectError;
use crate::mapping::MappingError;
use crate::sql::TranslationError;

/// Every failure a translation call can report.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Broken or ambiguous mapping metadata, including property paths the mapping does
    /// not define.
    #[error("Configuration error: {0}")]
    Configuration(MappingError),

    #[error("Translation error: {0}")]
    Translation(TranslationError),

    /// Rejected input such as an empty batch; nothing was translated.
    #[error("Invalid argument: {0}")]
    Argument(String),
}

impl Error {
    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }
}

impl From<MappingError> for Error {
    fn from(e: MappingError) -> Self {
        Error::Configuration(e)
    }
}

impl From<TranslationError> for Error {
    fn from(e: TranslationError) -> Self {
        match e {
            TranslationError::Mapping(mapping) => Error::Configuration(mapping),
            other => Error::Translation(other),
        }
    }
}

impl From<DialectError> for Error {
    fn from(e: DialectError) -> Self {
        Error::Translation(TranslationError::Dialect(e))
    }
}
