use super::{base_type_name, string_literal, DialectError, SqlDialect};
use crate::mapping::{Column, DbType, EntityMap, ForeignKey, Index};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn type_name(&self, db_type: DbType) -> &'static str {
        match db_type {
            DbType::Boolean => "tinyint(1)",
            DbType::Currency => "decimal(19, 4)",
            DbType::DateTime2 | DbType::DateTimeOffset => "datetime",
            DbType::Double => "double",
            DbType::Guid => "char(36)",
            DbType::String => "varchar",
            DbType::StringFixedLength => "char",
            DbType::Xml => "text",
            other => base_type_name(other),
        }
    }

    fn column_type(&self, column: &Column) -> String {
        if column.max_length && column.db_type.is_textual() {
            return "longtext".to_string();
        }
        if column.max_length && column.db_type == DbType::Binary {
            return "longblob".to_string();
        }
        let name = self.type_name(column.db_type);
        match (column.db_type, column.length, column.precision, column.scale) {
            (DbType::Decimal, _, Some(precision), Some(scale)) => {
                format!("{}({}, {})", name, precision, scale)
            }
            (t, Some(length), _, _) if t.takes_length() => format!("{}({})", name, length),
            _ => name.to_string(),
        }
    }

    fn auto_generate_modifier(&self) -> &'static str {
        " auto_increment"
    }

    fn change_table_name(&self, from: &EntityMap, to: &EntityMap) -> Result<String, DialectError> {
        Ok(format!(
            "rename table {} to {}",
            self.quote_table(from),
            self.quote_table(to)
        ))
    }

    fn change_column_name(
        &self,
        map: &EntityMap,
        from: &Column,
        to: &Column,
    ) -> Result<String, DialectError> {
        Ok(format!(
            "alter table {} change column {} {}",
            self.quote_table(map),
            self.quote_identifier(&from.db_name),
            self.column_definition(to)
        ))
    }

    fn modify_column(
        &self,
        map: &EntityMap,
        _from: &Column,
        to: &Column,
    ) -> Result<String, DialectError> {
        Ok(format!(
            "alter table {} modify column {}",
            self.quote_table(map),
            self.column_definition(to)
        ))
    }

    fn drop_foreign_key(
        &self,
        foreign_key: &ForeignKey,
        child: &EntityMap,
    ) -> Result<String, DialectError> {
        Ok(format!(
            "alter table {} drop foreign key {}",
            self.quote_table(child),
            self.quote_identifier(&foreign_key.name)
        ))
    }

    fn drop_index(&self, map: &EntityMap, index: &Index) -> Result<String, DialectError> {
        Ok(format!(
            "drop index {} on {}",
            self.quote_identifier(&index.name),
            self.quote_table(map)
        ))
    }

    fn check_database_exists(&self, database: &str) -> Result<String, DialectError> {
        Ok(format!(
            "select 1 from information_schema.schemata where schema_name = {}",
            string_literal(database)
        ))
    }

    /// The largest row count MySQL accepts in a limit clause.
    fn max_row_count(&self) -> u64 {
        u64::MAX
    }

    fn apply_row_limit(&self, sql: &mut String, order_clause: &str, take: i64) -> Result<(), DialectError> {
        sql.push_str(order_clause);
        sql.push_str(&format!(" limit {}", take));
        Ok(())
    }

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

        sql.push_str(order_clause);
        let take = if take > 0 {
            take.to_string()
        } else {
            self.max_row_count().to_string()
        };
        sql.push_str(&format!(" limit {}, {}", skip, take));
        Ok(0)
    }

    fn id_sql(&self) -> Result<String, DialectError> {
        Ok("select last_insert_id() id".to_string())
    }

    fn append_for_update_table_hint(&self, _table_sql: &mut String) -> Result<(), DialectError> {
        Ok(())
    }

    fn append_for_update_on_query_finish(&self, sql: &mut String) -> Result<(), DialectError> {
        sql.push_str(" for update");
        Ok(())
    }

    /// MySQL refuses to read the target table in a subquery of an update or delete
    /// unless the subquery is materialized first.
    fn wrap_key_subquery(&self, subquery: &str) -> String {
        format!("(select * from ({}) as keys_to_modify)", subquery)
    }
}
