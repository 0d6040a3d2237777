use crate::{
    error::{Error, Result},
    sql::{
        schema::Column,
        types::{DataType, Row, Value},
    },
};

/// Splits a record line into its fields.
///
/// Fields are separated by spaces; a run of spaces counts as one separator so padded
/// records decode the same way. A `'` or `"` opens a quote that lasts until the same
/// character appears again, and spaces inside it belong to the field.
pub fn split_fields(line: &str) -> Result<Vec<&str>> {
    let mut fields = Vec::new();
    let mut start = None;
    let mut quote = None;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == ' ' => {
                if let Some(s) = start.take() {
                    fields.push(&line[s..i]);
                }
            }
            None => {
                start.get_or_insert(i);
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
            }
        }
    }

    if let Some(q) = quote {
        return Err(Error::Corrupt(format!(
            "unterminated {} quote in record {}",
            q, line
        )));
    }
    if let Some(s) = start {
        fields.push(&line[s..]);
    }
    Ok(fields)
}

/// Decodes one record line into a row typed by `columns`, field by field
pub fn decode_record(line: &str, columns: &[Column]) -> Result<Row> {
    let fields = split_fields(line)?;
    if fields.len() != columns.len() {
        return Err(Error::Corrupt(format!(
            "record has {} fields, expected {}: {}",
            fields.len(),
            columns.len(),
            line
        )));
    }
    fields
        .into_iter()
        .zip(columns)
        .map(|(field, column)| decode_field(field, column))
        .collect()
}

fn decode_field(field: &str, column: &Column) -> Result<Value> {
    let corrupt = |reason: String| {
        Error::Corrupt(format!(
            "field {} of column {} is not {}: {}",
            field, column.name, column.datatype, reason
        ))
    };
    Ok(match column.datatype {
        DataType::Integer => Value::Integer(field.parse().map_err(|e| corrupt(format!("{}", e)))?),
        DataType::Real => {
            let v: f64 = field.parse().map_err(|e| corrupt(format!("{}", e)))?;
            if !v.is_finite() {
                return Err(corrupt("not a finite number".into()));
            }
            Value::Real(v)
        }
        DataType::String => Value::String(strip_quotes(field).to_string()),
    })
}

/// Removes one pair of matching delimiting quotes, if present
fn strip_quotes(field: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = field.strip_prefix(q).and_then(|f| f.strip_suffix(q)) {
            return inner;
        }
    }
    field
}
