//! DML (Data Manipulation Language) support.
//!
//! This module provides types and builders for generating DML statements
//! (INSERT, UPDATE, DELETE) across different SQL dialects, plus the T-SQL
//! table-variable declaration used to capture generated keys.
//!
//! # Examples
//!
//! ```ignore
//! use quarry::sql::dml::{Insert, Update, Delete};
//! use quarry::sql::expr::{param, table_col, ExprExt};
//!
//! // INSERT
//! let insert = Insert::into("Orders")
//!     .columns(["CustomerID", "Total"])
//!     .values([param("p1", 1), param("p2", 2)]);
//!
//! // UPDATE
//! let update = Update::table("Orders")
//!     .set("Status", param("p1", 1))
//!     .filter(table_col("Orders", "OrderID").eq(param("p2", 2)));
//!
//! // DELETE
//! let delete = Delete::from("Orders")
//!     .filter(table_col("Orders", "OrderID").eq(param("p1", 1)));
//! ```

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expr, ExprExt};
use super::query::Query;
use super::token::{Token, TokenStream};
use super::types::FieldType;

fn push_table(ts: &mut TokenStream, schema: &Option<String>, table: &str) {
    ts.push(Token::QualifiedIdent {
        schema: schema.clone(),
        name: table.to_string(),
    });
}

fn push_ident_list(ts: &mut TokenStream, idents: &[String]) {
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.push(Token::Ident(ident.clone()));
    }
}

// ============================================================================
// INSERT
// ============================================================================

/// `OUTPUT INSERTED.<cols> INTO @variable` (T-SQL).
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInto {
    pub columns: Vec<String>,
    pub variable: String,
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
    pub from_query: Option<Box<Query>>,
    pub output_into: Option<OutputInto>,
    pub returning: Vec<String>,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
            from_query: None,
            output_into: None,
            returning: Vec::new(),
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    /// Set the columns to insert.
    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Add a row of values.
    pub fn values(mut self, vals: impl IntoIterator<Item = Expr>) -> Self {
        self.values.push(vals.into_iter().collect());
        self
    }

    /// Insert from a SELECT query.
    pub fn from_select(mut self, query: Query) -> Self {
        self.from_query = Some(Box::new(query));
        self
    }

    /// Capture the given inserted columns into a table variable (T-SQL).
    pub fn output_into(
        mut self,
        cols: impl IntoIterator<Item = impl Into<String>>,
        variable: impl Into<String>,
    ) -> Self {
        self.output_into = Some(OutputInto {
            columns: cols.into_iter().map(Into::into).collect(),
            variable: variable.into(),
        });
        self
    }

    /// Add RETURNING clause.
    pub fn returning(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // INSERT INTO
        ts.push(Token::Insert).space().push(Token::Into).space();
        push_table(&mut ts, &self.schema, &self.table);

        let default_row = self.columns.is_empty() && self.from_query.is_none();

        // Columns
        if !self.columns.is_empty() {
            ts.space().lparen();
            push_ident_list(&mut ts, &self.columns);
            ts.rparen();
        } else if default_row && !dialect.supports_default_values() {
            ts.space().lparen().rparen();
        }

        // T-SQL: OUTPUT goes before VALUES
        if let Some(output) = &self.output_into {
            ts.space().push(Token::Output).space();
            for (i, col) in output.columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.push(Token::Inserted)
                    .push(Token::Dot)
                    .push(Token::Ident(col.clone()));
            }
            ts.space()
                .push(Token::Into)
                .space()
                .push(Token::Variable(output.variable.clone()));
        }

        // VALUES or SELECT
        if let Some(ref query) = self.from_query {
            ts.newline().append(&query.to_tokens_for_dialect(dialect));
        } else if default_row {
            if dialect.supports_default_values() {
                ts.space().push(Token::Raw("DEFAULT VALUES".into()));
            } else {
                ts.space().push(Token::Values).space().lparen().rparen();
            }
        } else {
            ts.space().push(Token::Values);
            for (row_idx, row) in self.values.iter().enumerate() {
                if row_idx > 0 {
                    ts.comma();
                }
                ts.space().lparen();
                for (i, val) in row.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&val.to_tokens());
                }
                ts.rparen();
            }
        }

        // RETURNING (PostgreSQL)
        if !self.returning.is_empty() && dialect.supports_returning() {
            ts.space().push(Token::Returning).space();
            push_ident_list(&mut ts, &self.returning);
        }

        ts
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Update {
    pub schema: Option<String>,
    pub table: String,
    pub set: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

impl Update {
    /// Create a new UPDATE statement.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            set: Vec::new(),
            filter: None,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    /// Set a column to a value.
    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.set.push((column.into(), value));
        self
    }

    /// Add WHERE clause (ANDed with an existing one).
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        // UPDATE table
        ts.push(Token::Update).space();
        push_table(&mut ts, &self.schema, &self.table);

        // SET clause
        ts.newline().push(Token::Set).space();
        for (i, (col, expr)) in self.set.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone()))
                .space()
                .push(Token::Eq)
                .space()
                .append(&expr.to_tokens());
        }

        // WHERE clause
        if let Some(ref filter) = self.filter {
            ts.newline()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens());
        }

        ts
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Delete {
    pub schema: Option<String>,
    pub table: String,
    pub filter: Option<Expr>,
}

impl Delete {
    /// Create a new DELETE statement.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            filter: None,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    /// Add WHERE clause (ANDed with an existing one).
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        // DELETE FROM table
        ts.push(Token::Delete).space().push(Token::From).space();
        push_table(&mut ts, &self.schema, &self.table);

        // WHERE clause
        if let Some(ref filter) = self.filter {
            ts.newline()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens());
        }

        ts
    }
}

// ============================================================================
// DECLARE (T-SQL table variable)
// ============================================================================

/// `DECLARE @name TABLE (col type, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclareTable {
    pub variable: String,
    pub columns: Vec<(String, FieldType)>,
}

impl DeclareTable {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.columns.push((name.into(), ty));
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Declare)
            .space()
            .push(Token::Variable(self.variable.clone()))
            .space()
            .push(Token::Table)
            .space()
            .lparen();
        for (i, (name, ty)) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(name.clone()))
                .space()
                .push(Token::Raw(dialect.emit_data_type(ty)));
        }
        ts.rparen();
        ts
    }
}

// ============================================================================
// Tests
// ============================================================================
