//! Validated query model produced by the analyzer and consumed by the executor

use std::fmt::Display;

use crate::sql::{
    parser::ast::{Literal, Operator, OrderDirection},
    types::Aggregate,
};

pub mod analyzer;

pub use analyzer::Analyzer;

/// A statement bound to the schema
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    Insert { table: String },
    Update { table: String },
    Delete { table: String },
}

impl Query {
    /// Statement keyword, used when reporting queries that cannot be executed
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Select(_) => "SELECT",
            Query::Insert { .. } => "INSERT",
            Query::Update { .. } => "UPDATE",
            Query::Delete { .. } => "DELETE",
        }
    }
}

/// Validated SELECT; every name uses the schema's spelling
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<SelectColumn>,
    pub join: Option<Join>,
    pub where_clause: Option<Comparison>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub into: Option<String>,
}

/// Fully qualified column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub name: String,
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// Projected column, optionally wrapped in an aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub column: ColumnRef,
    pub function: Option<Aggregate>,
}

impl Display for SelectColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.function {
            Some(function) => write!(f, "{}({})", function, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: ColumnRef,
    pub operator: Operator,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: SelectColumn,
    pub direction: OrderDirection,
}

fn write_clause<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    clause: Option<T>,
) -> std::fmt::Result {
    match clause {
        Some(clause) => writeln!(f, "{} {}", label, clause),
        None => writeln!(f, "{} (NULL)", label),
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "**QUERY AST**")?;
        match self {
            Query::Select(select) => {
                writeln!(f, "Table: {}", select.table)?;
                for column in select.columns.iter() {
                    writeln!(f, "Select column: {}", column)?;
                }
                write_clause(
                    f,
                    "Join",
                    select.join.as_ref().map(|j| {
                        format!("{} On {} = {}", j.table, j.left, j.right)
                    }),
                )?;
                write_clause(
                    f,
                    "Where",
                    select
                        .where_clause
                        .as_ref()
                        .map(|w| format!("{} {} {}", w.column, w.operator, w.value)),
                )?;
                write_clause(
                    f,
                    "Order By",
                    select
                        .order_by
                        .as_ref()
                        .map(|o| format!("{} {}", o.column, o.direction)),
                )?;
                write_clause(f, "Limit", select.limit)?;
                write_clause(f, "Into", select.into.as_ref())?;
            }
            Query::Insert { table } | Query::Update { table } | Query::Delete { table } => {
                writeln!(f, "{}: {}", self.kind(), table)?;
            }
        }
        write!(f, "**END OF QUERY AST**")
    }
}
