use std::io::Write;

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    sql::{
        executor::{
            agg::Aggregate,
            query::{Filter, Limit, Order, Project, Scan},
        },
        plan::{Query, Select},
        schema::Database,
    },
};

mod agg;
mod query;
mod result;

pub use result::{ResultColumn, ResultTable};

/// SELECT pipeline stage; each stage runs its source and transforms the table it returns
pub trait Executor {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable>;
}

impl dyn Executor {
    /// Builds the pipeline for a SELECT:
    /// scan, filter, order, project, aggregate, limit
    pub fn build(select: &Select) -> Box<dyn Executor> {
        let mut node: Box<dyn Executor> = Scan::new(select.table.clone());
        if let Some(comparison) = &select.where_clause {
            node = Filter::new(node, comparison.clone());
        }
        if let Some(order_by) = &select.order_by {
            node = Order::new(node, order_by.clone());
        }
        node = Project::new(node, select.columns.clone());
        if select.columns.iter().any(|c| c.function.is_some()) {
            node = Aggregate::new(node);
        }
        if let Some(limit) = select.limit {
            node = Limit::new(node, limit);
        }
        node
    }
}

/// Executes a query; only SELECT can be executed
pub fn execute(db: &Database, query: &Query) -> Result<ResultTable> {
    match query {
        Query::Select(select) => execute_select(db, select),
        query => Err(Error::NotSelect(query.kind().to_string())),
    }
}

pub fn execute_select(db: &Database, select: &Select) -> Result<ResultTable> {
    if let Some(join) = &select.join {
        warn!(table = %join.table, "JOIN is not supported, reading {} only", select.table);
    }
    if let Some(into) = &select.into {
        warn!(table = %into, "INTO is not supported, results are not stored");
    }
    debug!(table = %select.table, columns = select.columns.len(), "executing select");
    <dyn Executor>::build(select).execute(db)
}

/// Executes a query and renders its result to `out`
pub fn execute_query(db: &Database, query: &Query, out: &mut impl Write) -> Result<()> {
    execute(db, query)?.render(out)
}
