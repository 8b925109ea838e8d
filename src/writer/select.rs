use serde::Serialize;

use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::mapping::MappingRegistry;
use crate::query::{Direction, SelectQuery};
use crate::sql::{FetchPlan, FetchPlanner, JoinTree, Parameters, TranslationError, WhereClauseWriter};

use super::ROOT_ALIAS;

/// A translated select together with the plan for reading its rows back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectWriterResult {
    pub sql: String,
    pub parameters: Parameters,
    #[serde(skip)]
    pub fetch_plan: FetchPlan,
}

pub struct SelectWriter<'a> {
    registry: &'a MappingRegistry,
    dialect: &'a dyn SqlDialect,
}

impl<'a> SelectWriter<'a> {
    pub fn new(registry: &'a MappingRegistry, dialect: &'a dyn SqlDialect) -> Self {
        SelectWriter { registry, dialect }
    }

    pub fn generate(&self, query: &SelectQuery) -> Result<SelectWriterResult, Error> {
        if query.take.is_some_and(|take| take < 0) {
            return Err(Error::argument("take must not be negative"));
        }
        if query.skip.is_some_and(|skip| skip < 0) {
            return Err(Error::argument("skip must not be negative"));
        }

        let mut tree = JoinTree::new(self.registry, &query.entity, ROOT_ALIAS)?;
        let mut plan = FetchPlanner::new(self.registry).plan(query, &mut tree)?;
        if query.is_paged() {
            if let Some(path) = plan.collection_path() {
                return Err(TranslationError::PagingWithCollectionFetch {
                    path: path.to_string(),
                }
                .into());
            }
        }

        let mut params = Parameters::new();
        let mut where_writer = WhereClauseWriter::new(self.registry, self.dialect);
        let filter = where_writer.write_all(&query.predicates, &mut tree, &mut params)?;

        let mut order_by = Vec::with_capacity(query.order.len());
        for clause in &query.order {
            let column = where_writer.column_sql(&clause.path, &mut tree)?;
            let direction = match clause.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            order_by.push(format!("{} {}", column, direction));
        }
        if order_by.is_empty() && query.is_paged() {
            // windowed paging needs a total order
            let key = self.registry.resolve(&query.entity)?.primary_key();
            order_by.push(format!(
                "{}.{} asc",
                tree.root_alias(),
                self.dialect.quote_identifier(&key.db_name)
            ));
        }
        let order_clause = if order_by.is_empty() {
            String::new()
        } else {
            format!(" order by {}", order_by.join(", "))
        };

        let mut table = tree.root_table_sql(self.dialect);
        if query.for_update {
            self.dialect.append_for_update_table_hint(&mut table)?;
        }
        let mut sql = format!(
            "select {} from {}{}",
            plan.select_list(self.dialect),
            table,
            tree.joins_sql(self.dialect)
        );
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(&filter);
        }

        if query.is_paged() {
            plan.leading_columns = self.dialect.apply_skip_take(
                &mut sql,
                &order_clause,
                query.take.unwrap_or(0),
                query.skip.unwrap_or(0),
            )?;
        } else {
            sql.push_str(&order_clause);
        }
        if query.for_update {
            self.dialect.append_for_update_on_query_finish(&mut sql)?;
        }

        log::debug!(
            "{} select on {}: {} parameters, {} joins",
            self.dialect.name(),
            query.entity,
            params.len(),
            tree.nodes().len() - 1
        );
        log::trace!("{}", sql);
        Ok(SelectWriterResult {
            sql,
            parameters: params,
            fetch_plan: plan,
        })
    }
}
