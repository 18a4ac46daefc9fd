//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`dml`] - Data Manipulation Language (INSERT, UPDATE, DELETE, DECLARE)
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`types`] - Semantic field types shared with entity metadata

pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, IdentityRetrieval, SqlDialect};
pub use expr::{
    avg, col, count, count_star, func, max, min, param, paren, raw_sql, star, sum, table_col,
    BinaryOperator, Expr, ExprExt, SortDir, UnaryOperator,
};
pub use query::{Join, JoinType, LimitOffset, OrderByExpr, Query, SelectExpr, TableRef};
pub use token::{Token, TokenStream};
pub use types::FieldType;

// Re-export DML types
pub use dml::{DeclareTable, Delete, Insert, OutputInto, Update};
