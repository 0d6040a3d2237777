use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{ColumnRef, Comparison, Join, Literal, Operator, OrderDirection, SelectItem};
use crate::sql::parser::lexer::{Keyword, Scanner, Token, TokenKind, Tokens};
use crate::sql::types::Aggregate;

pub mod ast;
pub mod lexer;

/// SQL Parser - Converts the scanner's tokens into an Abstract Syntax Tree (AST)
pub struct Parser<'a> {
    tokens: Peekable<Tokens<Chars<'a>>>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input
    pub fn new(input: &'a str) -> Self {
        Parser {
            tokens: Scanner::new(input.chars()).into_tokens().peekable(),
        }
    }

    /// Parses exactly one statement; nothing but end of input may follow its semicolon
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let stmt = self.parse_statement()?;
        self.next_expect(TokenKind::Semicolon)?;
        match self.next()? {
            token if token.kind == TokenKind::Eos => Ok(stmt),
            token => Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
        }
    }

    /// Parses the next `;`-terminated statement, or returns None at end of input
    pub fn next_statement(&mut self) -> Result<Option<ast::Statement>> {
        if self.peek_kind() == Some(TokenKind::Eos) {
            return Ok(None);
        }
        let stmt = self.parse_statement()?;
        self.next_expect(TokenKind::Semicolon)?;
        Ok(Some(stmt))
    }

    /// Parses a statement based on the first token
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Select)) => self.parse_select(),
            Some(TokenKind::Keyword(Keyword::Insert)) => self.parse_insert(),
            Some(TokenKind::Keyword(Keyword::Update)) => self.parse_update(),
            Some(TokenKind::Keyword(Keyword::Delete)) => self.parse_delete(),
            _ => Err(Error::Parse(format!("[Parser] Unexpected token {}", self.next()?))),
        }
    }

    /// Parses a SELECT statement
    fn parse_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(TokenKind::Keyword(Keyword::Select))?;

        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if self.next_if_token(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.next_expect(TokenKind::Keyword(Keyword::From))?;
        let from = self.next_ident()?;

        Ok(ast::Statement::Select(ast::Select {
            items,
            from,
            join: self.parse_join_clause()?,
            where_clause: self.parse_where_clause()?,
            order_by: self.parse_order_clause()?,
            limit: self.parse_limit_clause()?,
            into: self.parse_into_clause()?,
        }))
    }

    /// Parses `*`, `col`, `t.col` or `FUNC(col)`
    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let token = self.next()?;
        let function = match token.kind {
            TokenKind::Asterisk => return Ok(SelectItem::All),
            TokenKind::Identifier => {
                return Ok(SelectItem::Column(self.parse_column_ref_from(token.text)?));
            }
            TokenKind::Keyword(Keyword::Min) => Aggregate::Min,
            TokenKind::Keyword(Keyword::Max) => Aggregate::Max,
            TokenKind::Keyword(Keyword::Sum) => Aggregate::Sum,
            TokenKind::Keyword(Keyword::Avg) => Aggregate::Avg,
            TokenKind::Keyword(Keyword::Count) => Aggregate::Count,
            _ => {
                return Err(Error::Parse(format!(
                    "[Parser] Expected column, got token {}",
                    token
                )));
            }
        };
        self.next_expect(TokenKind::LeftParen)?;
        let column = self.parse_column_ref()?;
        self.next_expect(TokenKind::RightParen)?;
        Ok(SelectItem::Function(function, column))
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.next_ident()?;
        self.parse_column_ref_from(first)
    }

    /// Finishes a column reference whose first identifier is already consumed
    fn parse_column_ref_from(&mut self, first: String) -> Result<ColumnRef> {
        if self.next_if_token(TokenKind::Dot).is_some() {
            let name = self.next_ident()?;
            return Ok(ColumnRef {
                table: Some(first),
                name,
            });
        }
        Ok(ColumnRef {
            table: None,
            name: first,
        })
    }

    // [INNER] JOIN table ON col = col
    fn parse_join_clause(&mut self) -> Result<Option<Join>> {
        if self.next_if_token(TokenKind::Keyword(Keyword::Inner)).is_some() {
            self.next_expect(TokenKind::Keyword(Keyword::Join))?;
        } else if self.next_if_token(TokenKind::Keyword(Keyword::Join)).is_none() {
            return Ok(None);
        }
        let table = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::On))?;
        let left = self.parse_column_ref()?;
        self.next_expect(TokenKind::Equal)?;
        let right = self.parse_column_ref()?;
        Ok(Some(Join { table, left, right }))
    }

    // WHERE col op literal
    fn parse_where_clause(&mut self) -> Result<Option<Comparison>> {
        if self.next_if_token(TokenKind::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        let column = self.parse_column_ref()?;
        let token = self.next()?;
        let operator = match token.kind {
            TokenKind::Less => Operator::Less,
            TokenKind::LessEqual => Operator::LessEqual,
            TokenKind::Greater => Operator::Greater,
            TokenKind::GreaterEqual => Operator::GreaterEqual,
            TokenKind::Equal => Operator::Equal,
            TokenKind::NotEqual => Operator::NotEqual,
            TokenKind::Keyword(Keyword::Like) => Operator::Like,
            _ => {
                return Err(Error::Parse(format!(
                    "[Parser] Expected operator, got token {}",
                    token
                )));
            }
        };
        let value = self.parse_literal()?;
        Ok(Some(Comparison {
            column,
            operator,
            value,
        }))
    }

    // ORDER BY item [ASC | DESC]
    fn parse_order_clause(&mut self) -> Result<Option<(SelectItem, OrderDirection)>> {
        if self.next_if_token(TokenKind::Keyword(Keyword::Order)).is_none() {
            return Ok(None);
        }
        self.next_expect(TokenKind::Keyword(Keyword::By))?;
        let item = match self.parse_select_item()? {
            SelectItem::All => {
                return Err(Error::Parse("[Parser] Cannot order by *".into()));
            }
            item => item,
        };
        let direction = if self.next_if_token(TokenKind::Keyword(Keyword::Desc)).is_some() {
            OrderDirection::Desc
        } else {
            self.next_if_token(TokenKind::Keyword(Keyword::Asc));
            OrderDirection::Asc
        };
        Ok(Some((item, direction)))
    }

    // LIMIT n
    fn parse_limit_clause(&mut self) -> Result<Option<i64>> {
        if self.next_if_token(TokenKind::Keyword(Keyword::Limit)).is_none() {
            return Ok(None);
        }
        let token = self.next_expect(TokenKind::IntLiteral)?;
        Ok(Some(token.text.parse()?))
    }

    // INTO table
    fn parse_into_clause(&mut self) -> Result<Option<String>> {
        if self.next_if_token(TokenKind::Keyword(Keyword::Into)).is_none() {
            return Ok(None);
        }
        Ok(Some(self.next_ident()?))
    }

    /// Parses INSERT statement
    fn parse_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(TokenKind::Keyword(Keyword::Insert))?;
        self.next_expect(TokenKind::Keyword(Keyword::Into))?;

        let table_name = self.next_ident()?;

        // Check if specific columns are specified
        let columns = if self.next_if_token(TokenKind::LeftParen).is_some() {
            let mut cols = Vec::new();
            loop {
                cols.push(self.next_ident()?);
                let token = self.next()?;
                match token.kind {
                    TokenKind::RightParen => break,
                    TokenKind::Comma => {}
                    _ => {
                        return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
                    }
                }
            }
            Some(cols)
        } else {
            None
        };

        self.next_expect(TokenKind::Keyword(Keyword::Values))?;
        // Multiple value rows: INSERT INTO tbl VALUES (1,2),(3,4);
        let mut values = Vec::new();
        loop {
            self.next_expect(TokenKind::LeftParen)?;
            let mut row = Vec::new();
            loop {
                row.push(self.parse_literal()?);
                let token = self.next()?;
                match token.kind {
                    TokenKind::RightParen => break,
                    TokenKind::Comma => {}
                    _ => {
                        return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
                    }
                }
            }
            values.push(row);
            if self.next_if_token(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(ast::Statement::Insert {
            table_name,
            columns,
            values,
        })
    }

    /// Parses UPDATE statement
    fn parse_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(TokenKind::Keyword(Keyword::Update))?;
        let table_name = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::Set))?;

        let mut columns = BTreeMap::new();
        loop {
            let col = self.next_ident()?;
            self.next_expect(TokenKind::Equal)?;
            let value = self.parse_literal()?;
            if columns.contains_key(&col) {
                return Err(Error::Parse(format!(
                    "[Parser] Duplicate column {} for update",
                    col
                )));
            }
            columns.insert(col, value);
            if self.next_if_token(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(ast::Statement::Update {
            table_name,
            columns,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses DELETE statement
    fn parse_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(TokenKind::Keyword(Keyword::Delete))?;
        self.next_expect(TokenKind::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;
        Ok(ast::Statement::Delete {
            table_name,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses an integer, real or string literal
    fn parse_literal(&mut self) -> Result<Literal> {
        let token = self.next()?;
        Ok(match token.kind {
            TokenKind::IntLiteral => Literal::Integer(token.text.parse()?),
            TokenKind::RealLiteral => Literal::Real(token.text.parse()?),
            TokenKind::StringLiteral => Literal::String(token.text),
            _ => {
                return Err(Error::Parse(format!(
                    "[Parser] Unexpected literal token {}",
                    token
                )));
            }
        })
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.tokens.peek().map(|t| t.kind)
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        self.tokens
            .next()
            .ok_or_else(|| Error::Parse("[Parser] Unexpected end of input".to_string()))
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier => Ok(token.text),
            _ => Err(Error::Parse(format!(
                "[Parser] Expected ident, got token {}",
                token
            ))),
        }
    }

    /// Expects a token of the given kind, returns error if different
    fn next_expect(&mut self, expect: TokenKind) -> Result<Token> {
        let token = self.next()?;
        if token.kind != expect {
            return Err(Error::Parse(format!(
                "[Parser] Expected token {}, got {}",
                expect, token
            )));
        }
        Ok(token)
    }

    /// Consumes next token if it is of the given kind
    fn next_if_token(&mut self, kind: TokenKind) -> Option<Token> {
        self.tokens.next_if(|t| t.kind == kind)
    }
}
