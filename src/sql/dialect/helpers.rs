//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};
use super::super::types::FieldType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL (SQL Server, Azure SQL)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// Placeholders
// =============================================================================

/// Named placeholder `@name`.
/// Used by: T-SQL, MySQL (named-parameter connectors)
pub fn placeholder_named(name: &str) -> String {
    format!("@{}", name)
}

/// Positional placeholder `$n`.
/// Used by: Postgres
pub fn placeholder_positional(position: usize) -> String {
    format!("${}", position)
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Postgres, MySQL
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(row_count(lim));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(row_count(off));
    }

    ts
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY (T-SQL style).
/// Used by: T-SQL
/// Note: Requires ORDER BY clause in T-SQL
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(row_count(off))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(row_count(lim))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    ts
}

/// Row counts beyond `i64::MAX` saturate instead of wrapping negative.
fn row_count(n: u64) -> Token {
    Token::LitInt(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Emit `TOP (n)`.
/// Used by: T-SQL
pub fn emit_top_tsql(n: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Top)
        .space()
        .lparen()
        .push(row_count(n))
        .rparen();
    ts
}

// =============================================================================
// Data Type Emission
// =============================================================================

/// Emit data type for ANSI/Postgres style.
/// Used by: Postgres
pub fn emit_data_type_ansi(ty: &FieldType) -> String {
    match ty {
        FieldType::Bool => "BOOLEAN".into(),
        FieldType::Int16 => "SMALLINT".into(),
        FieldType::Int32 => "INTEGER".into(),
        FieldType::Int64 => "BIGINT".into(),
        FieldType::Float32 => "REAL".into(),
        FieldType::Float64 => "DOUBLE PRECISION".into(),
        FieldType::String => "TEXT".into(),
        FieldType::Varchar(n) => format!("VARCHAR({})", n),
        FieldType::Date => "DATE".into(),
        FieldType::Timestamp => "TIMESTAMP".into(),
        FieldType::Uuid => "UUID".into(),
        FieldType::Binary => "BYTEA".into(),
    }
}

/// Emit data type for MySQL.
pub fn emit_data_type_mysql(ty: &FieldType) -> String {
    match ty {
        FieldType::Bool => "TINYINT(1)".into(),
        FieldType::Int16 => "SMALLINT".into(),
        FieldType::Int32 => "INT".into(),
        FieldType::Int64 => "BIGINT".into(),
        FieldType::Float32 => "FLOAT".into(),
        FieldType::Float64 => "DOUBLE".into(),
        FieldType::String => "TEXT".into(),
        FieldType::Varchar(n) => format!("VARCHAR({})", n),
        FieldType::Date => "DATE".into(),
        FieldType::Timestamp => "DATETIME".into(),
        FieldType::Uuid => "CHAR(36)".into(),
        FieldType::Binary => "BLOB".into(),
    }
}

/// Emit data type for T-SQL.
pub fn emit_data_type_tsql(ty: &FieldType) -> String {
    match ty {
        FieldType::Bool => "BIT".into(),
        FieldType::Int16 => "SMALLINT".into(),
        FieldType::Int32 => "INT".into(),
        FieldType::Int64 => "BIGINT".into(),
        FieldType::Float32 => "REAL".into(),
        FieldType::Float64 => "FLOAT".into(),
        FieldType::String => "NVARCHAR(MAX)".into(),
        FieldType::Varchar(n) if *n > 4000 => "NVARCHAR(MAX)".into(),
        FieldType::Varchar(n) => format!("NVARCHAR({})", n),
        FieldType::Date => "DATE".into(),
        FieldType::Timestamp => "DATETIME2".into(),
        FieldType::Uuid => "UNIQUEIDENTIFIER".into(),
        FieldType::Binary => "VARBINARY(MAX)".into(),
    }
}
