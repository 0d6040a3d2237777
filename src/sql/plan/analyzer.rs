use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{self, Literal, Operator},
        plan::{ColumnRef, Comparison, Join, OrderBy, Query, Select, SelectColumn},
        schema::{Database, Table},
        types::{Aggregate, DataType},
    },
};

/// Semantic analyzer - binds an AST to the database schema
pub struct Analyzer<'a> {
    db: &'a Database,
}

/// Tables a SELECT may reference: the FROM table and an optional JOIN table
struct Scope<'a> {
    from: &'a Table,
    join: Option<&'a Table>,
}

impl<'a> Analyzer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Builds a validated query from an AST statement
    pub fn build(&self, stmt: ast::Statement) -> Result<Query> {
        Ok(match stmt {
            ast::Statement::Select(select) => Query::Select(self.build_select(select)?),
            ast::Statement::Insert { table_name, .. } => Query::Insert {
                table: self.resolve_table(&table_name)?.name.clone(),
            },
            ast::Statement::Update { table_name, .. } => Query::Update {
                table: self.resolve_table(&table_name)?.name.clone(),
            },
            ast::Statement::Delete { table_name, .. } => Query::Delete {
                table: self.resolve_table(&table_name)?.name.clone(),
            },
        })
    }

    fn build_select(&self, select: ast::Select) -> Result<Select> {
        let from = self.resolve_table(&select.from)?;
        let mut scope = Scope { from, join: None };

        let join = match select.join {
            Some(join) => {
                let table = self.resolve_table(&join.table)?;
                scope.join = Some(table);
                let (left, _) = scope.resolve(&join.left)?;
                let (right, _) = scope.resolve(&join.right)?;
                Some(Join {
                    table: table.name.clone(),
                    left,
                    right,
                })
            }
            None => None,
        };

        let mut columns = Vec::new();
        for item in select.items {
            match item {
                ast::SelectItem::All => {
                    columns.extend(from.columns.iter().map(|c| SelectColumn {
                        column: ColumnRef {
                            table: from.name.clone(),
                            name: c.name.clone(),
                        },
                        function: None,
                    }));
                }
                item => columns.push(scope.select_column(&item)?),
            }
        }

        let where_clause = match select.where_clause {
            Some(comparison) => Some(scope.comparison(comparison)?),
            None => None,
        };

        let order_by = match select.order_by {
            Some((item, direction)) => Some(OrderBy {
                column: scope.select_column(&item)?,
                direction,
            }),
            None => None,
        };

        let limit = match select.limit {
            Some(n) if n < 0 => {
                return Err(Error::Semantic(format!(
                    "limit must not be negative, got {}",
                    n
                )));
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        Ok(Select {
            table: from.name.clone(),
            columns,
            join,
            where_clause,
            order_by,
            limit,
            into: select.into,
        })
    }

    fn resolve_table(&self, name: &str) -> Result<&'a Table> {
        self.db
            .get_table(name)
            .ok_or_else(|| Error::Semantic(format!("table {} does not exist", name)))
    }
}

impl<'a> Scope<'a> {
    /// Resolves a column reference to its table and declared type
    fn resolve(&self, column: &ast::ColumnRef) -> Result<(ColumnRef, DataType)> {
        let candidates: Vec<&Table> = match &column.table {
            Some(name) => {
                let table = std::iter::once(self.from)
                    .chain(self.join)
                    .find(|t| t.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        Error::Semantic(format!(
                            "table {} is not part of the query",
                            name
                        ))
                    })?;
                vec![table]
            }
            None => std::iter::once(self.from).chain(self.join).collect(),
        };

        candidates
            .into_iter()
            .find_map(|table| {
                table.get_column(&column.name).map(|c| {
                    (
                        ColumnRef {
                            table: table.name.clone(),
                            name: c.name.clone(),
                        },
                        c.datatype,
                    )
                })
            })
            .ok_or_else(|| Error::Semantic(format!("column {} does not exist", column.name)))
    }

    /// Resolves a column that must come from the FROM table
    fn resolve_from(&self, column: &ast::ColumnRef) -> Result<(ColumnRef, DataType)> {
        let (resolved, datatype) = self.resolve(column)?;
        if resolved.table != self.from.name {
            return Err(Error::Semantic(format!(
                "column {} of joined table cannot be used outside the join condition",
                resolved
            )));
        }
        Ok((resolved, datatype))
    }

    fn select_column(&self, item: &ast::SelectItem) -> Result<SelectColumn> {
        match item {
            ast::SelectItem::All => Err(Error::Semantic("unexpected *".into())),
            ast::SelectItem::Column(column) => Ok(SelectColumn {
                column: self.resolve_from(column)?.0,
                function: None,
            }),
            ast::SelectItem::Function(function, column) => {
                let (column, datatype) = self.resolve_from(column)?;
                if matches!(function, Aggregate::Sum | Aggregate::Avg) && !datatype.is_numeric() {
                    return Err(Error::Semantic(format!(
                        "{} requires a numeric column, {} is {}",
                        function, column, datatype
                    )));
                }
                Ok(SelectColumn {
                    column,
                    function: Some(*function),
                })
            }
        }
    }

    fn comparison(&self, comparison: ast::Comparison) -> Result<Comparison> {
        let (column, datatype) = self.resolve_from(&comparison.column)?;
        let compatible = match (&comparison.operator, datatype, &comparison.value) {
            (Operator::Like, DataType::String, Literal::String(_)) => true,
            (Operator::Like, _, _) => false,
            (_, DataType::Integer, Literal::Integer(_)) => true,
            (_, DataType::Real, Literal::Integer(_) | Literal::Real(_)) => true,
            (_, DataType::String, Literal::String(_)) => true,
            _ => false,
        };
        if !compatible {
            return Err(Error::Semantic(format!(
                "cannot compare {} column {} with {} {}",
                datatype, column, comparison.operator, comparison.value
            )));
        }
        Ok(Comparison {
            column,
            operator: comparison.operator,
            value: comparison.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Analyzer;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::{Parser, ast::OrderDirection},
            plan::{ColumnRef, Query, SelectColumn},
            schema::{Column, Database, IndexKind, Table},
            types::{Aggregate, DataType},
        },
    };

    fn database() -> Database {
        Database::new(
            "MovieLens",
            "MovieLens",
            vec![
                Table {
                    name: "Movies".into(),
                    record_size: 60,
                    columns: vec![
                        Column::new("Movie_ID", DataType::Integer, IndexKind::Unique),
                        Column::new("Title", DataType::String, IndexKind::None),
                        Column::new("Revenue", DataType::Real, IndexKind::None),
                    ],
                },
                Table {
                    name: "Ratings".into(),
                    record_size: 20,
                    columns: vec![
                        Column::new("Movie_ID", DataType::Integer, IndexKind::Indexed),
                        Column::new("Rating", DataType::Integer, IndexKind::None),
                    ],
                },
            ],
        )
    }

    fn analyze(sql: &str) -> Result<Query> {
        let db = database();
        Analyzer::new(&db).build(Parser::new(sql).parse()?)
    }

    fn column(table: &str, name: &str) -> ColumnRef {
        ColumnRef {
            table: table.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_analyze_select() -> Result<()> {
        let query = analyze(
            "select title, max(REVENUE) from movies where revenue > 10 order by Title desc limit 3;",
        )?;
        let Query::Select(select) = query else {
            panic!("expected select");
        };
        assert_eq!(select.table, "Movies");
        assert_eq!(
            select.columns,
            vec![
                SelectColumn {
                    column: column("Movies", "Title"),
                    function: None,
                },
                SelectColumn {
                    column: column("Movies", "Revenue"),
                    function: Some(Aggregate::Max),
                },
            ]
        );
        let order_by = select.order_by.expect("order by");
        assert_eq!(order_by.column.column, column("Movies", "Title"));
        assert_eq!(order_by.direction, OrderDirection::Desc);
        assert_eq!(select.limit, Some(3));
        Ok(())
    }

    #[test]
    fn test_analyze_star_and_join() -> Result<()> {
        let Query::Select(select) = analyze(
            "select * from Movies inner join Ratings on Movies.Movie_ID = Ratings.Movie_ID;",
        )?
        else {
            panic!("expected select");
        };
        let names = select
            .columns
            .iter()
            .map(|c| c.column.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Movie_ID", "Title", "Revenue"]);
        let join = select.join.expect("join");
        assert_eq!(join.table, "Ratings");
        assert_eq!(join.right, column("Ratings", "Movie_ID"));
        Ok(())
    }

    #[test]
    fn test_analyze_errors() {
        let bad = [
            "select x from Movies;",
            "select title from Nope;",
            "select sum(title) from Movies;",
            "select title from Movies where title > 3;",
            "select title from Movies where Movie_ID = 2.5;",
            "select title from Movies where revenue like 'a%';",
            "select title from Movies limit -1;",
            "select Ratings.Rating from Movies join Ratings on Movie_ID = Ratings.Movie_ID;",
            "select Other.title from Movies;",
        ];
        for sql in bad {
            match analyze(sql) {
                Err(Error::Semantic(_)) => {}
                other => panic!("{} should be rejected, got {:?}", sql, other),
            }
        }
    }

    #[test]
    fn test_analyze_real_accepts_integer_literal() -> Result<()> {
        assert!(analyze("select title from Movies where revenue >= 100;").is_ok());
        Ok(())
    }

    #[test]
    fn test_analyze_non_select() -> Result<()> {
        assert_eq!(
            analyze("insert into movies values (1, 'x', 2.0);")?,
            Query::Insert {
                table: "Movies".into()
            }
        );
        assert_eq!(
            analyze("delete from ratings where rating < 2;")?,
            Query::Delete {
                table: "Ratings".into()
            }
        );
        Ok(())
    }

    #[test]
    fn test_query_display() -> Result<()> {
        let query = analyze(
            "select count(title), revenue from movies where title = \"Schindler's List\" limit 1;",
        )?;
        assert_eq!(
            query.to_string(),
            "**QUERY AST**\n\
             Table: Movies\n\
             Select column: COUNT(Movies.Title)\n\
             Select column: Movies.Revenue\n\
             Join (NULL)\n\
             Where Movies.Title = \"Schindler's List\"\n\
             Order By (NULL)\n\
             Limit 1\n\
             Into (NULL)\n\
             **END OF QUERY AST**"
        );
        Ok(())
    }
}
