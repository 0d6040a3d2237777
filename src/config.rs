use std::path::PathBuf;

use crate::{error::Result, sql::schema::Database};

/// Runtime configuration of the interactive query loop
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing one sub-directory per database
    pub data_dir: PathBuf,

    /// Database to open
    pub database: String,

    /// Print the schema listing after loading
    pub print_schema: bool,

    /// Print each analyzed query before executing it
    pub print_ast: bool,

    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database: String::new(),
            print_schema: false,
            print_ast: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn new<P: Into<PathBuf>>(data_dir: P, database: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            database: database.to_string(),
            ..Default::default()
        }
    }

    /// Builder: print the schema listing
    pub fn print_schema(mut self, enabled: bool) -> Self {
        self.print_schema = enabled;
        self
    }

    /// Builder: print analyzed queries
    pub fn print_ast(mut self, enabled: bool) -> Self {
        self.print_ast = enabled;
        self
    }

    /// Builder: set log level
    pub fn log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    /// `<data_dir>/<database>`, where the schema and table files live
    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::open(&self.data_dir, &self.database)
    }
}
