//! SimpleSQL - a small single-table SQL query engine
//!
//! This crate provides:
//! - SQL scanning and parsing (lexer, parser, AST)
//! - Semantic analysis against a JSON schema
//! - SELECT execution over flat-file tables into an in-memory result table

pub mod config;
pub mod error;
pub mod sql;
pub mod storage;
