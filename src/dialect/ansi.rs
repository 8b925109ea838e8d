use super::{base_type_name, SqlDialect};
use crate::mapping::DbType;

/// The portable baseline. Everything without standard syntax is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiSqlDialect;

impl SqlDialect for AnsiSqlDialect {
    fn name(&self) -> &'static str {
        "Ansi-SQL"
    }

    fn type_name(&self, db_type: DbType) -> &'static str {
        match db_type {
            DbType::Binary => "bit",
            DbType::Boolean | DbType::Byte => "smallint unsigned",
            DbType::DateTime | DbType::DateTime2 => "timestamp",
            DbType::DateTimeOffset => "timestamptz",
            DbType::Double => "double precision",
            other => base_type_name(other),
        }
    }
}
