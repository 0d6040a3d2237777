use tracing::debug;

use crate::{
    error::Result,
    sql::{
        executor::{self, ResultTable},
        parser::{Parser, ast::Statement},
        plan::{Analyzer, Query},
        schema::Database,
    },
};

/// SQL session over one opened database
pub struct Session {
    db: Database,
}

impl Session {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Binds a parsed statement to the session's schema
    pub fn analyze(&self, stmt: Statement) -> Result<Query> {
        Analyzer::new(&self.db).build(stmt)
    }

    pub fn execute_query(&self, query: &Query) -> Result<ResultTable> {
        executor::execute(&self.db, query)
    }

    /// Parses and analyzes each `;`-terminated statement of `sql` in turn. A syntax error
    /// is yielded once and ends the sequence, since the rest of the text can't be resynced.
    pub fn queries<'a>(&'a self, sql: &'a str) -> impl Iterator<Item = Result<Query>> + 'a {
        let mut parser = Parser::new(sql);
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            match parser.next_statement() {
                Ok(Some(stmt)) => Some(self.analyze(stmt)),
                Ok(None) => None,
                Err(err) => {
                    done = true;
                    Some(Err(err))
                }
            }
        })
    }

    /// Executes one `;`-terminated SQL statement
    pub fn execute(&self, sql: &str) -> Result<ResultTable> {
        let stmt = Parser::new(sql).parse()?;
        let query = self.analyze(stmt)?;
        debug!(kind = query.kind(), "statement analyzed");
        self.execute_query(&query)
    }
}
