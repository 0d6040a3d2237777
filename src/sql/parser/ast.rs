use std::{collections::BTreeMap, fmt::Display};

use crate::sql::types::{Aggregate, format_real, quote};

/// Abstract Syntax Tree (AST) node definitions for SimpleSQL statements
#[derive(Debug, PartialEq)]
pub enum Statement {
    /// SELECT statement
    Select(Select),
    /// INSERT statement
    Insert {
        table_name: String,
        columns: Option<Vec<String>>,
        values: Vec<Vec<Literal>>,
    },
    /// UPDATE statement
    Update {
        table_name: String,
        columns: BTreeMap<String, Literal>,
        where_clause: Option<Comparison>,
    },
    /// DELETE statement
    Delete {
        table_name: String,
        where_clause: Option<Comparison>,
    },
}

/// SELECT statement body
#[derive(Debug, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub from: String,
    pub join: Option<Join>,
    pub where_clause: Option<Comparison>,
    pub order_by: Option<(SelectItem, OrderDirection)>,
    pub limit: Option<i64>,
    pub into: Option<String>,
}

/// One entry of the select list
#[derive(Debug, PartialEq, Clone)]
pub enum SelectItem {
    /// `*`
    All,
    Column(ColumnRef),
    /// Aggregate over a column, e.g. `COUNT(id)`
    Function(Aggregate, ColumnRef),
}

/// Column reference, optionally qualified with a table name (`t.c`)
#[derive(Debug, PartialEq, Clone)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: &str) -> Self {
        Self {
            table: None,
            name: name.to_string(),
        }
    }

    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            name: name.to_string(),
        }
    }
}

/// `INNER JOIN table ON left = right`
#[derive(Debug, PartialEq, Clone)]
pub struct Join {
    pub table: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// Single comparison of a column against a literal
#[derive(Debug, PartialEq, Clone)]
pub struct Comparison {
    pub column: ColumnRef,
    pub operator: Operator,
    pub value: Literal,
}

/// Comparison operators
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Like,
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Like => "like",
        })
    }
}

/// Sort direction (ascending or descending)
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl Display for OrderDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        })
    }
}

/// Literal values in SQL expressions
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    String(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Real(r) => f.write_str(&format_real(*r)),
            Literal::String(s) => f.write_str(&quote(s)),
        }
    }
}
