use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::MappingRegistry;
use crate::query::SelectQuery;
use crate::sql::{JoinTree, Parameters, WhereClauseWriter};

use super::{SqlWriterResult, ROOT_ALIAS};

/// Counts the rows a select would match. Ordering, paging and fetches do not apply.
pub struct CountWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> CountWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        CountWriter { registry, dialect }
    }

    pub fn generate(&self, query: &SelectQuery) -> Result<SqlWriterResult, Error> {
        let mut tree = JoinTree::new(self.registry, &query.entity, ROOT_ALIAS)?;
        let mut params = Parameters::new();
        let filter = WhereClauseWriter::new(self.registry, self.dialect).write_all(
            &query.predicates,
            &mut tree,
            &mut params,
        )?;

        let mut sql = format!(
            "select count(1) from {}{}",
            tree.root_table_sql(self.dialect),
            tree.joins_sql(self.dialect)
        );
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(&filter);
        }
        log::debug!("Count of {} with {} parameters", query.entity, params.len());
        Ok(SqlWriterResult::new(sql, params))
    }
}
