use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::dialect::{DialectKind, SqlDialect};
use crate::mapping::Convention;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Engine configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[validate(schema(function = "validate_decimal_scale"))]
#[serde(default)]
pub struct EngineConfig {
    /// Target SQL dialect
    pub dialect: DialectKind,

    /// Length of string columns that do not configure one
    #[validate(range(
        min = 1,
        max = 8000,
        message = "String length must be between 1 and 8000"
    ))]
    pub string_length: u16,

    /// Precision of decimal columns that do not configure one
    #[validate(range(
        min = 1,
        max = 38,
        message = "Decimal precision must be between 1 and 38"
    ))]
    pub decimal_precision: u8,

    /// Scale of decimal columns that do not configure one
    #[validate(range(max = 38, message = "Decimal scale must be at most 38"))]
    pub decimal_scale: u8,

    /// Whether table names default to the plural of the entity name
    pub pluralize_table_names: bool,

    /// Whether primary keys are generated by the database unless configured otherwise
    pub auto_generated_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let convention = Convention::default();
        Self {
            dialect: DialectKind::default(),
            string_length: convention.string_length,
            decimal_precision: convention.decimal_precision,
            decimal_scale: convention.decimal_scale,
            pluralize_table_names: convention.pluralize_table_names,
            auto_generated_keys: convention.auto_generated_keys,
        }
    }
}

fn validate_decimal_scale(config: &EngineConfig) -> Result<(), ValidationError> {
    if config.decimal_scale > config.decimal_precision {
        let mut error = ValidationError::new("decimal_scale");
        error.message = Some("Decimal scale cannot exceed decimal precision".into());
        return Err(error);
    }
    Ok(())
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            dialect: parse_env_var("TESSERA_DIALECT", "sqlserver")?,
            string_length: parse_env_var("TESSERA_STRING_LENGTH", "255")?,
            decimal_precision: parse_env_var("TESSERA_DECIMAL_PRECISION", "18")?,
            decimal_scale: parse_env_var("TESSERA_DECIMAL_SCALE", "10")?,
            pluralize_table_names: parse_env_var("TESSERA_PLURALIZE_TABLES", "true")?,
            auto_generated_keys: parse_env_var("TESSERA_AUTO_GENERATED_KEYS", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content.to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Naming and sizing defaults for the mapping registry
    pub fn convention(&self) -> Convention {
        Convention {
            string_length: self.string_length,
            decimal_precision: self.decimal_precision,
            decimal_scale: self.decimal_scale,
            pluralize_table_names: self.pluralize_table_names,
            auto_generated_keys: self.auto_generated_keys,
        }
    }

    pub fn dialect(&self) -> Arc<dyn SqlDialect> {
        self.dialect.create()
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
