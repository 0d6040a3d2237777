//! SQL processing module
//!
//! This module provides:
//! - `parser`: SQL scanner and parser
//! - `types`: column types and cell values
//! - `schema`: database, table and column definitions
//! - `plan`: semantic analysis into a validated query
//! - `executor`: SELECT pipeline and result table
//! - `engine`: session tying the stages together

pub mod parser;
pub mod types;
pub mod schema;
pub mod plan;
pub mod executor;
pub mod engine;
