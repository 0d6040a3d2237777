use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::parser::ast::Literal,
};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "real")]
    Real,
    #[serde(rename = "string")]
    String,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Real)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "int",
            DataType::Real => "real",
            DataType::String => "string",
        })
    }
}

/// Aggregate functions that collapse a column to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Count => "COUNT",
        })
    }
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    String(String),
}

impl Value {
    /// Converts a query literal into a value of the given column type
    pub fn from_literal(literal: &Literal, datatype: DataType) -> Result<Self> {
        Ok(match (literal, datatype) {
            (Literal::Integer(i), DataType::Integer) => Value::Integer(*i),
            (Literal::Integer(i), DataType::Real) => Value::Real(*i as f64),
            (Literal::Real(r), DataType::Real) => Value::Real(*r),
            (Literal::String(s), DataType::String) => Value::String(s.clone()),
            (literal, datatype) => {
                return Err(Error::Internal(format!(
                    "literal {} does not match column type {}",
                    literal, datatype
                )));
            }
        })
    }

    /// Zero value of a type, used where a cell must exist but has no source
    pub fn default_for(datatype: DataType) -> Self {
        match datatype {
            DataType::Integer => Value::Integer(0),
            DataType::Real => Value::Real(0.0),
            DataType::String => Value::String(String::new()),
        }
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::String(_) => DataType::String,
        }
    }
}

/// Formats a real in positional notation with at least one fractional digit.
///
/// Digits are the shortest ones that round-trip, so `1e16` prints as
/// `10000000000000000.0` and `1.5e-7` as `0.00000015`.
pub fn format_real(v: f64) -> String {
    let repr = format!("{:?}", v);
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return repr;
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return repr;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;

    if point <= 0 {
        format!("{}0.{}{}", sign, "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}{}.0", sign, digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, frac) = digits.split_at(point as usize);
        format!("{}{}.{}", sign, whole, frac)
    }
}

/// Quotes a string with single quotes unless it contains one
pub fn quote(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => f.write_str(&format_real(*v)),
            Value::String(v) => f.write_str(&quote(v)),
        }
    }
}

/// Ordering within one type: numeric for numbers, byte-wise for strings
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (_, _) => None,
        }
    }
}

/// A row holds one value per result column
pub type Row = Vec<Value>;
