use std::{cmp::Ordering, fmt::Display, io::Write};

use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::OrderDirection,
        types::{Aggregate, DataType, Row, Value},
    },
};

/// Column of a result table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Table the column was read from
    pub table: String,
    pub name: String,
    /// 1-based ordinal place, always equal to the column's index plus one
    pub position: usize,
    pub function: Option<Aggregate>,
    pub datatype: DataType,
}

impl ResultColumn {
    /// Header text: `table.col` or `FUNC(table.col)`
    pub fn label(&self) -> String {
        match self.function {
            Some(function) => format!("{}({}.{})", function, self.table, self.name),
            None => format!("{}.{}", self.table, self.name),
        }
    }
}

/// In-memory relation built and consumed by one query execution.
///
/// Every row holds exactly one cell per column, typed like that column. All mutations
/// keep that shape, so callers never see a half-updated table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<ResultColumn>,
    rows: Vec<Row>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends a column; only allowed while the table holds no rows
    pub fn insert_column(&mut self, table: &str, name: &str, datatype: DataType) -> Result<()> {
        if !self.rows.is_empty() {
            return Err(Error::Internal(format!(
                "cannot add column {} to a table with rows",
                name
            )));
        }
        self.columns.push(ResultColumn {
            table: table.to_string(),
            name: name.to_string(),
            position: self.columns.len() + 1,
            function: None,
            datatype,
        });
        Ok(())
    }

    /// Finds a column by table and name (case-insensitive)
    pub fn find_column(&self, table: &str, name: &str) -> Option<&ResultColumn> {
        self.columns.iter().find(|c| {
            c.table.eq_ignore_ascii_case(table) && c.name.eq_ignore_ascii_case(name)
        })
    }

    pub fn must_find_column(&self, table: &str, name: &str) -> Result<&ResultColumn> {
        self.find_column(table, name)
            .ok_or_else(|| Error::ColumnNotFound(format!("{}.{}", table, name)))
    }

    fn index_of(&self, position: usize) -> Result<usize> {
        match position {
            p if p >= 1 && p <= self.columns.len() => Ok(p - 1),
            p => Err(Error::Internal(format!("column position {} out of range", p))),
        }
    }

    fn renumber(&mut self) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.position = i + 1;
        }
    }

    /// Deletes the column at `position` together with its cell in every row
    pub fn delete_column(&mut self, position: usize) -> Result<ResultColumn> {
        let index = self.index_of(position)?;
        for row in self.rows.iter_mut() {
            row.remove(index);
        }
        let column = self.columns.remove(index);
        self.renumber();
        Ok(column)
    }

    /// Rebuilds the table from the columns at `positions`, in that order.
    ///
    /// A position may appear more than once; its cells are copied.
    pub fn select_columns(&mut self, positions: &[usize]) -> Result<()> {
        let indexes = positions
            .iter()
            .map(|p| self.index_of(*p))
            .collect::<Result<Vec<_>>>()?;
        self.columns = indexes.iter().map(|i| self.columns[*i].clone()).collect();
        self.renumber();
        for row in self.rows.iter_mut() {
            *row = indexes.iter().map(|i| row[*i].clone()).collect();
        }
        Ok(())
    }

    /// Tags the column at `position` with the aggregate applied to it
    pub fn set_function(&mut self, position: usize, function: Option<Aggregate>) -> Result<()> {
        let index = self.index_of(position)?;
        self.columns[index].function = function;
        Ok(())
    }

    /// Appends a row after checking it against the column list
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        if let Some((value, column)) = row
            .iter()
            .zip(self.columns.iter())
            .find(|(v, c)| v.datatype() != c.datatype)
        {
            return Err(Error::Internal(format!(
                "value {} does not match column {} of type {}",
                value,
                column.label(),
                column.datatype
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn get(&self, row: usize, position: usize) -> Option<&Value> {
        self.rows.get(row)?.get(position.checked_sub(1)?)
    }

    /// Cells of the column at `position`, in row order
    pub fn column_values(&self, position: usize) -> Result<Vec<&Value>> {
        let index = self.index_of(position)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Keeps the rows for which `predicate` holds, preserving their order
    pub fn retain_rows<F>(&mut self, mut predicate: F) -> Result<()>
    where
        F: FnMut(&Row) -> Result<bool>,
    {
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in std::mem::take(&mut self.rows) {
            if predicate(&row)? {
                kept.push(row);
            }
        }
        self.rows = kept;
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Keeps the first `n` rows
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Stable sort of the rows by the column at `position`
    pub fn sort_by_column(&mut self, position: usize, direction: OrderDirection) -> Result<()> {
        let index = self.index_of(position)?;
        self.rows.sort_by(|a, b| {
            let ordering = a[index].partial_cmp(&b[index]).unwrap_or(Ordering::Equal);
            match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
        Ok(())
    }

    /// Collapses the table to a single row holding the given aggregate results.
    ///
    /// Columns without a result keep the first row's cell; over an empty table they get
    /// their type's default value.
    pub fn collapse(&mut self, results: Vec<(usize, Aggregate, Value)>) -> Result<()> {
        let indexes = results
            .iter()
            .map(|(p, _, _)| self.index_of(*p))
            .collect::<Result<Vec<_>>>()?;

        let mut row = match self.rows.drain(..).next() {
            Some(row) => row,
            None => self
                .columns
                .iter()
                .map(|c| Value::default_for(c.datatype))
                .collect(),
        };
        for (index, (_, function, value)) in indexes.into_iter().zip(results) {
            let column = &mut self.columns[index];
            column.function = Some(function);
            column.datatype = value.datatype();
            row[index] = value;
        }
        self.rows = vec![row];
        Ok(())
    }

    /// Writes the header line followed by one line per row
    pub fn render(&self, out: &mut impl Write) -> Result<()> {
        write!(out, "{}", self).map_err(|e| Error::Internal(e.to_string()))
    }
}

impl Display for ResultTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels = self
            .columns
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>();
        writeln!(f, "{}", labels.join(", "))?;
        for row in self.rows.iter() {
            let cells = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            writeln!(f, "{}", cells.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ResultTable;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::ast::OrderDirection,
            types::{Aggregate, DataType, Value},
        },
    };

    fn table() -> Result<ResultTable> {
        let mut table = ResultTable::new();
        table.insert_column("t", "id", DataType::Integer)?;
        table.insert_column("t", "name", DataType::String)?;
        table.insert_column("t", "age", DataType::Integer)?;
        for (id, name, age) in [(1, "ann", 30), (2, "bob", 25), (3, "cy", 30)] {
            table.push_row(vec![
                Value::Integer(id),
                Value::String(name.into()),
                Value::Integer(age),
            ])?;
        }
        Ok(table)
    }

    fn assert_shape(table: &ResultTable) {
        for row in table.rows() {
            assert_eq!(row.len(), table.columns().len());
        }
        for (i, column) in table.columns().iter().enumerate() {
            assert_eq!(column.position, i + 1);
        }
    }

    #[test]
    fn test_push_row_checks_shape() -> Result<()> {
        let mut table = table()?;
        assert!(matches!(
            table.push_row(vec![Value::Integer(4)]),
            Err(Error::Internal(_))
        ));
        assert!(matches!(
            table.push_row(vec![
                Value::Integer(4),
                Value::Integer(5),
                Value::Integer(6)
            ]),
            Err(Error::Internal(_))
        ));
        assert!(table.insert_column("t", "extra", DataType::Real).is_err());
        assert_eq!(table.num_rows(), 3);
        Ok(())
    }

    #[test]
    fn test_delete_and_select_columns() -> Result<()> {
        let mut table = table()?;
        let deleted = table.delete_column(1)?;
        assert_eq!(deleted.name, "id");
        assert_shape(&table);
        assert_eq!(table.must_find_column("T", "AGE")?.position, 2);

        table.select_columns(&[2, 1, 2])?;
        assert_shape(&table);
        assert_eq!(
            table.rows()[1],
            vec![
                Value::Integer(25),
                Value::String("bob".into()),
                Value::Integer(25)
            ]
        );
        assert!(table.select_columns(&[4]).is_err());
        assert!(matches!(
            table.must_find_column("t", "id"),
            Err(Error::ColumnNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_rows() -> Result<()> {
        let mut table = table()?;
        table.sort_by_column(3, OrderDirection::Desc)?;
        assert_eq!(table.get(0, 2), Some(&Value::String("ann".into())));
        assert_eq!(table.get(1, 2), Some(&Value::String("cy".into())));

        table.retain_rows(|row| Ok(row[2] == Value::Integer(30)))?;
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.delete_row(0).map(|r| r[0].clone()), Some(Value::Integer(1)));
        assert_eq!(table.delete_row(5), None);
        table.truncate(0);
        assert_eq!(table.num_rows(), 0);
        assert_shape(&table);
        Ok(())
    }

    #[test]
    fn test_collapse() -> Result<()> {
        let mut table = table()?;
        table.collapse(vec![(1, Aggregate::Avg, Value::Real(2.0))])?;
        assert_shape(&table);
        assert_eq!(
            table.to_string(),
            "AVG(t.id), t.name, t.age\n2.0, 'ann', 30\n"
        );

        let mut empty = ResultTable::new();
        empty.insert_column("t", "name", DataType::String)?;
        empty.insert_column("t", "n", DataType::Integer)?;
        empty.collapse(vec![(2, Aggregate::Count, Value::Integer(0))])?;
        assert_eq!(empty.to_string(), "t.name, COUNT(t.n)\n'', 0\n");
        Ok(())
    }

    #[test]
    fn test_render() -> Result<()> {
        let table = table()?;
        let mut out = Vec::new();
        table.render(&mut out)?;
        assert_eq!(
            String::from_utf8(out).map_err(|e| Error::Internal(e.to_string()))?,
            "t.id, t.name, t.age\n1, 'ann', 30\n2, 'bob', 25\n3, 'cy', 30\n"
        );
        Ok(())
    }
}
