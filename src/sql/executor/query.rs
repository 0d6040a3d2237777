use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::Operator,
        plan::{Comparison, OrderBy, SelectColumn},
        schema::Database,
        types::Value,
    },
    storage::TableFile,
};

use super::{Executor, ResultTable};

/// Table scan executor - seeds one column per schema column and decodes every record
pub struct Scan {
    table_name: String,
}

impl Scan {
    pub fn new(table_name: String) -> Box<Self> {
        Box::new(Self { table_name })
    }
}

impl Executor for Scan {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let table = db.must_get_table(&self.table_name)?;
        let file = TableFile::open(&db.data_path(table), table.record_size)?;
        debug!(table = %table.name, path = %file.path().display(), "scanning table");

        let mut result = ResultTable::new();
        for column in table.columns.iter() {
            result.insert_column(&table.name, &column.name, column.datatype)?;
        }
        for row in file.records(&table.columns) {
            result.push_row(row?)?;
        }
        debug!(rows = result.num_rows(), "records decoded");
        Ok(result)
    }
}

/// WHERE executor - keeps the rows whose cell satisfies the comparison
pub struct Filter {
    source: Box<dyn Executor>,
    comparison: Comparison,
}

impl Filter {
    pub fn new(source: Box<dyn Executor>, comparison: Comparison) -> Box<Self> {
        Box::new(Self { source, comparison })
    }
}

impl Executor for Filter {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let mut table = self.source.execute(db)?;
        let column = &self.comparison.column;
        let target = table.must_find_column(&column.table, &column.name)?;
        let index = target.position - 1;
        let value = Value::from_literal(&self.comparison.value, target.datatype)?;
        let operator = self.comparison.operator;

        table.retain_rows(|row| compare(&row[index], operator, &value))?;
        debug!(rows = table.num_rows(), "rows after filter");
        Ok(table)
    }
}

/// Evaluates `cell <operator> value` under the column's declared type
fn compare(cell: &Value, operator: Operator, value: &Value) -> Result<bool> {
    let ordering = || {
        cell.partial_cmp(value)
            .ok_or_else(|| Error::Internal(format!("can not compare {} with {}", cell, value)))
    };
    Ok(match operator {
        Operator::Less => ordering()?.is_lt(),
        Operator::LessEqual => ordering()?.is_le(),
        Operator::Greater => ordering()?.is_gt(),
        Operator::GreaterEqual => ordering()?.is_ge(),
        Operator::Equal => ordering()?.is_eq(),
        Operator::NotEqual => ordering()?.is_ne(),
        Operator::Like => match (cell, value) {
            (Value::String(s), Value::String(pattern)) => like(s, pattern),
            _ => {
                return Err(Error::Internal(format!(
                    "can not match {} like {}",
                    cell, value
                )));
            }
        },
    })
}

/// Matches `text` against a LIKE pattern: `%` is any run of characters, `_` exactly one
fn like(text: &str, pattern: &str) -> bool {
    let text = text.chars().collect::<Vec<_>>();
    let pattern = pattern.chars().collect::<Vec<_>>();
    let (mut t, mut p) = (0, 0);
    // Last `%` seen and the text position it currently absorbs up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    backtrack = Some((star, absorbed + 1));
                    p = star + 1;
                    t = absorbed + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// ORDER BY executor - stable sort on one column
///
/// Ordering by an aggregate does nothing since the result collapses to one row.
pub struct Order {
    source: Box<dyn Executor>,
    order_by: OrderBy,
}

impl Order {
    pub fn new(source: Box<dyn Executor>, order_by: OrderBy) -> Box<Self> {
        Box::new(Self { source, order_by })
    }
}

impl Executor for Order {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let mut table = self.source.execute(db)?;
        if self.order_by.column.function.is_some() {
            return Ok(table);
        }
        let column = &self.order_by.column.column;
        let position = table.must_find_column(&column.table, &column.name)?.position;
        table.sort_by_column(position, self.order_by.direction)?;
        Ok(table)
    }
}

/// Projection executor - keeps the selected columns in the selected order
///
/// Columns not named in the select list are dropped; a column selected twice is copied.
pub struct Project {
    source: Box<dyn Executor>,
    columns: Vec<SelectColumn>,
}

impl Project {
    pub fn new(source: Box<dyn Executor>, columns: Vec<SelectColumn>) -> Box<Self> {
        Box::new(Self { source, columns })
    }
}

impl Executor for Project {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let mut table = self.source.execute(db)?;
        let positions = self
            .columns
            .iter()
            .map(|c| {
                table
                    .must_find_column(&c.column.table, &c.column.name)
                    .map(|c| c.position)
            })
            .collect::<Result<Vec<_>>>()?;
        table.select_columns(&positions)?;
        for (i, column) in self.columns.iter().enumerate() {
            table.set_function(i + 1, column.function)?;
        }
        Ok(table)
    }
}

/// LIMIT executor - keeps the first N rows
pub struct Limit {
    source: Box<dyn Executor>,
    limit: usize,
}

impl Limit {
    pub fn new(source: Box<dyn Executor>, limit: usize) -> Box<Self> {
        Box::new(Self { source, limit })
    }
}

impl Executor for Limit {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let mut table = self.source.execute(db)?;
        table.truncate(self.limit);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{compare, like};
    use crate::{
        error::Result,
        sql::{parser::ast::Operator, types::Value},
    };

    #[test]
    fn test_like() {
        assert!(like("Star Wars", "Star%"));
        assert!(like("Star Wars", "%Wars"));
        assert!(like("Star Wars", "S_ar W%s"));
        assert!(like("", "%"));
        assert!(like("abcabd", "%abd"));
        assert!(like("a%b", "a%b"));
        assert!(!like("Star Wars", "star%"));
        assert!(!like("ab", "a_b"));
        assert!(!like("abc", "ab"));
        assert!(!like("", "_"));
    }

    #[test]
    fn test_compare() -> Result<()> {
        let n = Value::Integer(3);
        assert!(compare(&n, Operator::Greater, &Value::Integer(2))?);
        assert!(compare(&n, Operator::LessEqual, &Value::Integer(3))?);
        assert!(!compare(&n, Operator::NotEqual, &Value::Integer(3))?);
        assert!(compare(&Value::Real(2.5), Operator::Less, &Value::Real(3.0))?);

        let s = Value::String("Heat".into());
        assert!(compare(&s, Operator::Less, &Value::String("Jaws".into()))?);
        assert!(compare(&s, Operator::Like, &Value::String("H%".into()))?);
        assert!(compare(&s, Operator::Equal, &Value::Integer(1)).is_err());
        Ok(())
    }
}
