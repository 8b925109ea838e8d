//! SQL dialects: identifier quoting, type names, paging and DDL fragments.
//!
//! [`SqlDialect`] carries the portable behaviour as default methods. Operations with no
//! portable syntax fail with [`DialectError::Unsupported`] unless a dialect overrides
//! them; nothing here ever emits a best-effort guess.

pub mod ansi;
pub mod errors;
pub mod mysql;
pub mod sql_server;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::mapping::{Column, DbType, EntityMap, ForeignKey, Index};

pub use ansi::AnsiSqlDialect;
pub use errors::DialectError;
pub use mysql::MySqlDialect;
pub use sql_server::SqlServerDialect;

lazy_static::lazy_static! {
    static ref BASE_TYPE_NAMES: HashMap<DbType, &'static str> = {
        let mut m = HashMap::new();
        m.insert(DbType::AnsiString, "varchar");
        m.insert(DbType::AnsiStringFixedLength, "char");
        m.insert(DbType::Binary, "varbinary");
        m.insert(DbType::Boolean, "bit");
        m.insert(DbType::Byte, "tinyint");
        m.insert(DbType::Currency, "money");
        m.insert(DbType::Date, "date");
        m.insert(DbType::DateTime, "datetime");
        m.insert(DbType::DateTime2, "datetime");
        m.insert(DbType::DateTimeOffset, "datetimeoffset");
        m.insert(DbType::Decimal, "decimal");
        m.insert(DbType::Double, "float");
        m.insert(DbType::Guid, "char(36)");
        m.insert(DbType::Int16, "smallint");
        m.insert(DbType::Int32, "int");
        m.insert(DbType::Int64, "bigint");
        m.insert(DbType::Object, "blob");
        m.insert(DbType::Single, "real");
        m.insert(DbType::String, "nvarchar");
        m.insert(DbType::StringFixedLength, "nchar");
        m.insert(DbType::Time, "time");
        m.insert(DbType::Xml, "xml");
        m
    };
}

/// Type name shared by dialects that do not override it.
pub fn base_type_name(db_type: DbType) -> &'static str {
    BASE_TYPE_NAMES.get(&db_type).copied().unwrap_or("varchar")
}

/// Default value expression for a non-nullable column with no configured default.
fn base_default(db_type: DbType) -> Option<&'static str> {
    match db_type {
        t if t.is_numeric() => Some("0"),
        DbType::Boolean => Some("0"),
        t if t.is_textual() => Some("''"),
        DbType::Date => Some("current_date"),
        DbType::Time => Some("current_time"),
        DbType::DateTime | DbType::DateTime2 | DbType::DateTimeOffset => {
            Some("current_timestamp")
        }
        _ => None,
    }
}

/// Escapes a value for use inside a single-quoted SQL string literal.
pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub trait SqlDialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes an identifier, doubling any closing quote character inside it.
    fn quote_identifier(&self, identifier: &str) -> String {
        let (open, close) = self.quote_chars();
        let escaped = identifier.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    fn quote_table_name(&self, schema: Option<&str>, table: &str) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            ),
            None => self.quote_identifier(table),
        }
    }

    fn quote_table(&self, map: &EntityMap) -> String {
        self.quote_table_name(map.schema.as_deref(), &map.table)
    }

    fn type_name(&self, db_type: DbType) -> &'static str {
        base_type_name(db_type)
    }

    /// Type name plus size hints, e.g. `nvarchar(255)` or `decimal(18, 10)`.
    fn column_type(&self, column: &Column) -> String {
        let name = self.type_name(column.db_type);
        if column.db_type == DbType::Decimal {
            if let (Some(precision), Some(scale)) = (column.precision, column.scale) {
                return format!("{}({}, {})", name, precision, scale);
            }
        }
        if column.db_type.takes_length() {
            if column.max_length {
                return format!("{}(max)", name);
            }
            if let Some(length) = column.length {
                return format!("{}({})", name, length);
            }
        }
        name.to_string()
    }

    fn auto_generate_modifier(&self) -> &'static str {
        " generated by default as identity"
    }

    /// The default expression applied in DDL: the configured one, else a zero value
    /// for non-nullable scalar columns.
    fn default_for(&self, column: &Column) -> Option<String> {
        if let Some(default) = &column.default {
            return Some(default.clone());
        }
        if column.is_nullable || column.is_primary_key || column.is_reference() {
            return None;
        }
        base_default(column.db_type).map(str::to_string)
    }

    fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.db_name),
            self.column_type(column)
        );
        sql.push_str(if column.is_nullable { " null" } else { " not null" });
        if column.is_auto_generated {
            sql.push_str(self.auto_generate_modifier());
        }
        if column.is_primary_key {
            sql.push_str(" primary key");
        }
        if let Some(default) = self.default_for(column) {
            sql.push_str(&format!(" default ({})", default));
        }
        sql
    }

    fn create_table(&self, map: &EntityMap) -> String {
        let columns = map
            .owned_columns()
            .map(|c| self.column_definition(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("create table {} ({})", self.quote_table(map), columns)
    }

    fn drop_table(&self, map: &EntityMap) -> String {
        format!("drop table {}", self.quote_table(map))
    }

    fn add_column(&self, map: &EntityMap, column: &Column) -> String {
        format!(
            "alter table {} add {}",
            self.quote_table(map),
            self.column_definition(column)
        )
    }

    /// Statement to run before dropping a column, when the dialect needs one.
    fn on_before_drop_column(&self, _map: &EntityMap, _column: &Column) -> Option<String> {
        None
    }

    fn drop_column(&self, map: &EntityMap, column: &Column) -> String {
        format!(
            "alter table {} drop column {}",
            self.quote_table(map),
            self.quote_identifier(&column.db_name)
        )
    }

    fn change_table_name(&self, _from: &EntityMap, _to: &EntityMap) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "renaming a table"))
    }

    fn change_column_name(
        &self,
        _map: &EntityMap,
        _from: &Column,
        _to: &Column,
    ) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "changing a column name"))
    }

    fn modify_column(
        &self,
        _map: &EntityMap,
        _from: &Column,
        _to: &Column,
    ) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "changing a column type"))
    }

    fn create_foreign_key(
        &self,
        foreign_key: &ForeignKey,
        child: &EntityMap,
        column: &Column,
        parent: &EntityMap,
    ) -> String {
        format!(
            "alter table {} add constraint {} foreign key ({}) references {}({})",
            self.quote_table(child),
            self.quote_identifier(&foreign_key.name),
            self.quote_identifier(&column.db_name),
            self.quote_table(parent),
            self.quote_identifier(&parent.primary_key().db_name)
        )
    }

    fn drop_foreign_key(
        &self,
        _foreign_key: &ForeignKey,
        _child: &EntityMap,
    ) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "dropping a foreign key"))
    }

    /// True when unique indexes treat nulls as equal, so a unique index over nullable
    /// columns must filter the nulls out.
    fn unique_index_filters_nulls(&self) -> bool {
        false
    }

    fn create_index(&self, map: &EntityMap, index: &Index) -> String {
        let columns: Vec<&Column> = index
            .columns
            .iter()
            .filter_map(|name| map.try_column(name))
            .collect();
        let mut sql = format!(
            "create {}index {} on {} ({})",
            if index.is_unique { "unique " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_table(map),
            columns
                .iter()
                .map(|c| self.quote_identifier(&c.db_name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        if index.is_unique && self.unique_index_filters_nulls() {
            let nullable: Vec<String> = columns
                .iter()
                .filter(|c| c.is_nullable)
                .map(|c| format!("{} is not null", self.quote_identifier(&c.db_name)))
                .collect();
            if !nullable.is_empty() {
                sql.push_str(" where ");
                sql.push_str(&nullable.join(" and "));
            }
        }
        sql
    }

    fn drop_index(&self, _map: &EntityMap, _index: &Index) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "dropping an index"))
    }

    fn check_database_exists(&self, _database: &str) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "checking that a database exists"))
    }

    /// Upper window bound used when a skip is given without a take.
    fn max_row_count(&self) -> u64 {
        i64::MAX as u64
    }

    /// Appends `order_clause` and limits the result to `take` rows.
    fn apply_row_limit(&self, sql: &mut String, order_clause: &str, take: i64) -> Result<(), DialectError> {
        sql.push_str(order_clause);
        sql.push_str(&format!(" fetch first {} rows only", take));
        Ok(())
    }

    /// Applies ordering and paging to a base `select` that has no order clause yet.
    ///
    /// `order_clause` is either empty or starts with ` order by`. Returns the number of
    /// extra leading columns the rewrite adds to every result row.
    fn apply_skip_take(
        &self,
        sql: &mut String,
        order_clause: &str,
        take: i64,
        skip: i64,
    ) -> Result<usize, DialectError> {
        if skip <= 0 {
            if take > 0 {
                self.apply_row_limit(sql, order_clause, take)?;
            } else {
                sql.push_str(order_clause);
            }
            return Ok(0);
        }

        let Some(rest) = sql.strip_prefix("select ") else {
            return Err(DialectError::NotASelect(sql.clone()));
        };
        // i128 so that bounds near i64::MAX cannot overflow
        let upper = if take > 0 {
            (i128::from(skip) + i128::from(take)).to_string()
        } else {
            self.max_row_count().to_string()
        };
        *sql = format!(
            "select * from (select ROW_NUMBER() OVER ({}) as RowNum, {}) as pagetable \
             where pagetable.RowNum between {} and {} order by pagetable.RowNum",
            order_clause.trim(),
            rest,
            i128::from(skip) + 1,
            upper
        );
        Ok(1)
    }

    /// Statement returning the key generated by the preceding insert.
    fn id_sql(&self) -> Result<String, DialectError> {
        Err(DialectError::unsupported(self.name(), "reading the last inserted id"))
    }

    /// Row locking expressed as a hint on the root table reference.
    fn append_for_update_table_hint(&self, _table_sql: &mut String) -> Result<(), DialectError> {
        Err(DialectError::unsupported(self.name(), "locking selected rows"))
    }

    /// Row locking expressed at the end of the statement.
    fn append_for_update_on_query_finish(&self, _sql: &mut String) -> Result<(), DialectError> {
        Err(DialectError::unsupported(self.name(), "locking selected rows"))
    }

    /// Whether NOT must be pushed down to the leaves of a predicate.
    fn pushes_negation_to_leaves(&self) -> bool {
        false
    }

    /// Wraps the key subquery of an update or delete that needs joins.
    fn wrap_key_subquery(&self, subquery: &str) -> String {
        format!("({})", subquery)
    }
}

/// The built-in dialects, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DialectKind {
    #[serde(rename = "ansi")]
    Ansi,
    #[default]
    #[serde(rename = "sqlserver")]
    SqlServer,
    #[serde(rename = "mysql")]
    MySql,
}

impl DialectKind {
    pub fn create(&self) -> Arc<dyn SqlDialect> {
        match self {
            DialectKind::Ansi => Arc::new(AnsiSqlDialect),
            DialectKind::SqlServer => Arc::new(SqlServerDialect),
            DialectKind::MySql => Arc::new(MySqlDialect),
        }
    }
}

impl FromStr for DialectKind {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ansi" | "ansisql" => Ok(DialectKind::Ansi),
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            "mysql" => Ok(DialectKind::MySql),
            other => Err(DialectError::UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialectKind::Ansi => "ansi",
            DialectKind::SqlServer => "sqlserver",
            DialectKind::MySql => "mysql",
        };
        write!(f, "{}", s)
    }
}
