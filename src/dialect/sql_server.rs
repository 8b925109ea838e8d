use uuid::Uuid;

use super::{base_type_name, string_literal, DialectError, SqlDialect};
use crate::mapping::{Column, DbType, EntityMap, ForeignKey, Index};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "SqlServer"
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn type_name(&self, db_type: DbType) -> &'static str {
        match db_type {
            DbType::Boolean => "bit",
            DbType::DateTime2 => "datetime2",
            DbType::Guid => "uniqueidentifier",
            DbType::Object => "sql_variant",
            other => base_type_name(other),
        }
    }

    fn auto_generate_modifier(&self) -> &'static str {
        " identity(1,1)"
    }

    fn default_for(&self, column: &Column) -> Option<String> {
        if column.default.is_none()
            && column.db_type == DbType::Guid
            && !column.is_nullable
            && !column.is_primary_key
            && !column.is_reference()
        {
            return Some("newid()".to_string());
        }
        if let Some(default) = &column.default {
            return Some(default.clone());
        }
        if column.is_nullable || column.is_primary_key || column.is_reference() {
            return None;
        }
        match column.db_type {
            DbType::DateTime | DbType::DateTime2 | DbType::DateTimeOffset => {
                Some("getdate()".to_string())
            }
            DbType::Date => Some("cast(getdate() as date)".to_string()),
            DbType::Time => Some("cast(getdate() as time)".to_string()),
            t if t.is_numeric() || t == DbType::Boolean => Some("0".to_string()),
            t if t.is_textual() => Some("''".to_string()),
            _ => None,
        }
    }

    /// Drops the column's default constraint, whose name SQL Server generates.
    fn on_before_drop_column(&self, map: &EntityMap, column: &Column) -> Option<String> {
        let command = format!("@OBDCommand{}", Uuid::new_v4().simple());
        Some(format!(
            "declare {command} nvarchar(1000);\n\
             select {command} = 'ALTER TABLE {table} drop constraint ' + d.name \
             from sys.tables t \
             join sys.default_constraints d on d.parent_object_id = t.object_id \
             join sys.columns c on c.object_id = t.object_id and c.column_id = d.parent_column_id \
             where t.name = {table_name} and c.name = {column_name};\n\
             execute({command});\n",
            command = command,
            table = self.quote_table(map).replace('\'', "''"),
            table_name = string_literal(&map.table),
            column_name = string_literal(&column.db_name),
        ))
    }

    fn change_table_name(&self, from: &EntityMap, to: &EntityMap) -> Result<String, DialectError> {
        Ok(format!(
            "EXEC sp_RENAME {}, {}",
            string_literal(&from.table),
            string_literal(&to.table)
        ))
    }

    fn change_column_name(
        &self,
        map: &EntityMap,
        from: &Column,
        to: &Column,
    ) -> Result<String, DialectError> {
        Ok(format!(
            "EXEC sp_RENAME {}, {}, 'COLUMN'",
            string_literal(&format!("{}.{}", map.table, from.db_name)),
            string_literal(&to.db_name)
        ))
    }

    fn modify_column(
        &self,
        map: &EntityMap,
        _from: &Column,
        to: &Column,
    ) -> Result<String, DialectError> {
        Ok(format!(
            "alter table {} alter column {}",
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
            "alter table {} drop constraint {}",
            self.quote_table(child),
            self.quote_identifier(&foreign_key.name)
        ))
    }

    fn unique_index_filters_nulls(&self) -> bool {
        true
    }

    fn drop_index(&self, map: &EntityMap, index: &Index) -> Result<String, DialectError> {
        Ok(format!(
            "drop index {}.{}",
            self.quote_table(map),
            self.quote_identifier(&index.name)
        ))
    }

    fn check_database_exists(&self, database: &str) -> Result<String, DialectError> {
        Ok(format!(
            "select 1 from sys.databases where name = {}",
            string_literal(database)
        ))
    }

    fn apply_row_limit(&self, sql: &mut String, order_clause: &str, take: i64) -> Result<(), DialectError> {
        if !sql.starts_with("select ") {
            return Err(DialectError::NotASelect(sql.clone()));
        }
        sql.insert_str("select".len(), &format!(" top ({})", take));
        sql.push_str(order_clause);
        Ok(())
    }

    fn id_sql(&self) -> Result<String, DialectError> {
        Ok("SELECT CAST(SCOPE_IDENTITY() as int) id".to_string())
    }

    fn append_for_update_table_hint(&self, table_sql: &mut String) -> Result<(), DialectError> {
        table_sql.push_str(" with (rowlock, xlock)");
        Ok(())
    }

    fn append_for_update_on_query_finish(&self, _sql: &mut String) -> Result<(), DialectError> {
        Ok(())
    }
}
