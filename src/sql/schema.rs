use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::types::DataType,
};

/// Name of the schema file inside a database directory
pub const SCHEMA_FILE: &str = "schema.json";

/// Database schema: an ordered list of tables stored under one directory
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub name: String,
    /// Directory holding `schema.json` and the `<table>.data` files
    pub dir: PathBuf,
    pub tables: Vec<Table>,
}

/// On-disk layout of `schema.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaFile {
    pub tables: Vec<Table>,
}

impl Database {
    pub fn new(name: &str, dir: impl Into<PathBuf>, tables: Vec<Table>) -> Self {
        Self {
            name: name.to_string(),
            dir: dir.into(),
            tables,
        }
    }

    /// Opens the database `name` under `data_dir` and reads its schema
    pub fn open(data_dir: &Path, name: &str) -> Result<Self> {
        let dir = data_dir.join(name);
        let path = dir.join(SCHEMA_FILE);
        let text = fs::read_to_string(&path).map_err(|e| {
            Error::Schema(format!(
                "unable to open database '{}' ({}): {}",
                name,
                path.display(),
                e
            ))
        })?;
        let schema: SchemaFile = serde_json::from_str(&text)?;
        for table in schema.tables.iter() {
            table.validate()?;
        }
        debug!(database = name, tables = schema.tables.len(), "schema loaded");
        Ok(Self::new(name, dir, schema.tables))
    }

    /// Looks up a table by name (case-insensitive)
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Returns table info, returns error if table doesn't exist
    pub fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Path of the table's data file: `<dir>/<table>.data`
    pub fn data_path(&self, table: &Table) -> PathBuf {
        self.dir.join(format!("{}.data", table.name))
    }
}

impl Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "**DATABASE SCHEMA**")?;
        writeln!(f, "Database: {}", self.name)?;
        for table in self.tables.iter() {
            writeln!(f, "Table: {}", table.name)?;
            writeln!(f, "  Record size: {}", table.record_size)?;
            for column in table.columns.iter() {
                writeln!(
                    f,
                    "  Column: {}, {}, {}",
                    column.name, column.datatype, column.index
                )?;
            }
        }
        write!(f, "**END OF DATABASE SCHEMA**")
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Fixed width of one encoded record line
    pub record_size: usize,
    pub columns: Vec<Column>,
}

impl Table {
    /// Validates table schema
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Schema(format!("table {} has no columns", self.name)));
        }
        if self.record_size == 0 {
            return Err(Error::Schema(format!(
                "table {} has a zero record size",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns the column index for a given column name (case-insensitive)
    pub fn get_col_index(&self, col_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(col_name))
    }

    pub fn get_column(&self, col_name: &str) -> Option<&Column> {
        self.get_col_index(col_name).map(|i| &self.columns[i])
    }
}

/// Column schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub datatype: DataType,
    #[serde(default)]
    pub index: IndexKind,
}

impl Column {
    pub fn new(name: &str, datatype: DataType, index: IndexKind) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            index,
        }
    }
}

/// Declared index of a column; informational only, never used for lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    None,
    Indexed,
    Unique,
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IndexKind::None => "non-indexed",
            IndexKind::Indexed => "indexed",
            IndexKind::Unique => "unique indexed",
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{Column, Database, IndexKind, SCHEMA_FILE, Table};
    use crate::{
        error::{Error, Result},
        sql::types::DataType,
    };

    #[test]
    fn test_open_database() -> Result<()> {
        let root = tempfile::tempdir().map_err(|e| Error::Internal(e.to_string()))?;
        let dir = root.path().join("MovieLens");
        fs::create_dir(&dir).map_err(|e| Error::Internal(e.to_string()))?;
        fs::write(
            dir.join(SCHEMA_FILE),
            r#"{"tables": [{"name": "Movies", "record_size": 48, "columns": [
                {"name": "Movie_ID", "type": "int", "index": "unique"},
                {"name": "Title", "type": "string"},
                {"name": "Revenue", "type": "real", "index": "indexed"}
            ]}]}"#,
        )
        .map_err(|e| Error::Internal(e.to_string()))?;

        let db = Database::open(root.path(), "MovieLens")?;
        assert_eq!(db.name, "MovieLens");
        let table = db.must_get_table("movies")?;
        assert_eq!(table.record_size, 48);
        assert_eq!(
            table.columns,
            vec![
                Column::new("Movie_ID", DataType::Integer, IndexKind::Unique),
                Column::new("Title", DataType::String, IndexKind::None),
                Column::new("Revenue", DataType::Real, IndexKind::Indexed),
            ]
        );
        assert_eq!(table.get_col_index("TITLE"), Some(1));
        assert_eq!(db.data_path(table), dir.join("Movies.data"));
        assert_eq!(
            db.must_get_table("Ratings"),
            Err(Error::TableNotFound("Ratings".into()))
        );
        Ok(())
    }

    #[test]
    fn test_open_database_errors() -> Result<()> {
        let root = tempfile::tempdir().map_err(|e| Error::Internal(e.to_string()))?;
        assert!(matches!(
            Database::open(root.path(), "missing"),
            Err(Error::Schema(_))
        ));

        let dir = root.path().join("bad");
        fs::create_dir(&dir).map_err(|e| Error::Internal(e.to_string()))?;
        fs::write(
            dir.join(SCHEMA_FILE),
            r#"{"tables": [{"name": "T", "record_size": 0, "columns": [{"name": "a", "type": "int"}]}]}"#,
        )
        .map_err(|e| Error::Internal(e.to_string()))?;
        assert!(matches!(
            Database::open(root.path(), "bad"),
            Err(Error::Schema(_))
        ));

        fs::write(dir.join(SCHEMA_FILE), "{not json").map_err(|e| Error::Internal(e.to_string()))?;
        assert!(matches!(
            Database::open(root.path(), "bad"),
            Err(Error::Schema(_))
        ));
        Ok(())
    }

    #[test]
    fn test_schema_display() {
        let db = Database::new(
            "db",
            "db",
            vec![Table {
                name: "T".into(),
                record_size: 10,
                columns: vec![
                    Column::new("id", DataType::Integer, IndexKind::Unique),
                    Column::new("name", DataType::String, IndexKind::None),
                ],
            }],
        );
        assert_eq!(
            db.to_string(),
            "**DATABASE SCHEMA**\n\
             Database: db\n\
             Table: T\n\
             \x20 Record size: 10\n\
             \x20 Column: id, int, unique indexed\n\
             \x20 Column: name, string, non-indexed\n\
             **END OF DATABASE SCHEMA**"
        );
    }
}
