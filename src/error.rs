use std::fmt::Display;

/// Custom Result type for SimpleSQL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SimpleSQL
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// SQL syntax error (scanner or parser)
    Parse(String),
    /// Query does not bind against the schema
    Semantic(String),
    /// Statement is valid but is not a SELECT
    NotSelect(String),
    /// Schema file missing or malformed
    Schema(String),
    /// Table name has no match in the database
    TableNotFound(String),
    /// Column name has no match in the result table
    ColumnNotFound(String),
    /// Table data file could not be opened or read
    DataFile { path: String, reason: String },
    /// Record in a data file does not match the table's columns
    Corrupt(String),
    /// Internal error
    Internal(String),
}

impl Error {
    /// Whether the error ends the session; syntax, binding and shape errors only skip
    /// the statement
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Parse(_) | Error::Semantic(_) | Error::NotSelect(_)
        )
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Schema(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error {}", err),
            Error::Semantic(err) => write!(f, "semantic error {}", err),
            Error::NotSelect(kind) => write!(f, "cannot execute {} query", kind),
            Error::Schema(err) => write!(f, "schema error {}", err),
            Error::TableNotFound(name) => write!(f, "table {} does not exist", name),
            Error::ColumnNotFound(name) => write!(f, "column {} not found", name),
            Error::DataFile { path, reason } => {
                write!(f, "unable to open file '{}': {}", path, reason)
            }
            Error::Corrupt(err) => write!(f, "corrupt data {}", err),
            Error::Internal(err) => write!(f, "internal error {}", err),
        }
    }
}
