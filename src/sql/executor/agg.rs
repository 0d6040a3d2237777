use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        schema::Database,
        types::{self, DataType, Value},
    },
};

use super::{Executor, ResultTable};

/// Aggregate executor - collapses the result to one row of MIN/MAX/SUM/AVG/COUNT values
///
/// Every aggregate is computed over the same input rows before the table is collapsed.
pub struct Aggregate {
    source: Box<dyn Executor>,
}

impl Aggregate {
    pub fn new(source: Box<dyn Executor>) -> Box<Self> {
        Box::new(Self { source })
    }
}

impl Executor for Aggregate {
    fn execute(self: Box<Self>, db: &Database) -> Result<ResultTable> {
        let mut table = self.source.execute(db)?;
        let mut results = Vec::new();
        for column in table.columns().iter() {
            let Some(function) = column.function else {
                continue;
            };
            let calculator = <dyn Calculator>::build(function);
            let values = table.column_values(column.position)?;
            let value = calculator.calc(&values, column.datatype)?;
            results.push((column.position, function, value));
        }
        debug!(aggregates = results.len(), rows = table.num_rows(), "aggregating");
        table.collapse(results)?;
        Ok(table)
    }
}

/// Trait for aggregate function calculations over one column's cells
pub trait Calculator {
    fn calc(&self, values: &[&Value], datatype: DataType) -> Result<Value>;
}

impl dyn Calculator {
    pub fn build(function: types::Aggregate) -> Box<dyn Calculator> {
        match function {
            types::Aggregate::Count => Count::new(),
            types::Aggregate::Sum => Sum::new(),
            types::Aggregate::Min => Min::new(),
            types::Aggregate::Max => Max::new(),
            types::Aggregate::Avg => Avg::new(),
        }
    }
}

/// COUNT - number of rows
pub struct Count;

impl Count {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Count {
    fn calc(&self, values: &[&Value], _: DataType) -> Result<Value> {
        Ok(Value::Integer(values.len() as i64))
    }
}

/// MIN - smallest value; the type's default over no rows
pub struct Min;

impl Min {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Min {
    fn calc(&self, values: &[&Value], datatype: DataType) -> Result<Value> {
        let mut min: Option<&Value> = None;
        for &value in values.iter() {
            if min.is_none_or(|m| value < m) {
                min = Some(value);
            }
        }
        Ok(min.cloned().unwrap_or_else(|| Value::default_for(datatype)))
    }
}

/// MAX - largest value; the type's default over no rows
pub struct Max;

impl Max {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Max {
    fn calc(&self, values: &[&Value], datatype: DataType) -> Result<Value> {
        let mut max: Option<&Value> = None;
        for &value in values.iter() {
            if max.is_none_or(|m| value > m) {
                max = Some(value);
            }
        }
        Ok(max.cloned().unwrap_or_else(|| Value::default_for(datatype)))
    }
}

/// SUM - total of a numeric column, typed like the column
pub struct Sum;

impl Sum {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Sum {
    fn calc(&self, values: &[&Value], datatype: DataType) -> Result<Value> {
        match datatype {
            DataType::Integer => {
                let mut sum: i64 = 0;
                for value in values.iter() {
                    match value {
                        Value::Integer(v) => {
                            sum = sum.checked_add(*v).ok_or_else(|| {
                                Error::Internal("integer overflow in SUM".into())
                            })?;
                        }
                        v => return Err(Error::Internal(format!("can not sum value {}", v))),
                    }
                }
                Ok(Value::Integer(sum))
            }
            DataType::Real => {
                let mut sum: f64 = 0.0;
                for value in values.iter() {
                    match value {
                        Value::Real(v) => sum += *v,
                        Value::Integer(v) => sum += *v as f64,
                        v => return Err(Error::Internal(format!("can not sum value {}", v))),
                    }
                }
                Ok(Value::Real(sum))
            }
            DataType::String => Err(Error::Internal("can not sum a string column".into())),
        }
    }
}

/// AVG - mean of a numeric column as a real; 0.0 over no rows
pub struct Avg;

impl Avg {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Avg {
    fn calc(&self, values: &[&Value], datatype: DataType) -> Result<Value> {
        // AVG = SUM / COUNT
        if values.is_empty() {
            return Ok(Value::Real(0.0));
        }
        let sum = match Sum::new().calc(values, datatype)? {
            Value::Integer(s) => s as f64,
            Value::Real(s) => s,
            v => return Err(Error::Internal(format!("can not average value {}", v))),
        };
        Ok(Value::Real(sum / values.len() as f64))
    }
}
