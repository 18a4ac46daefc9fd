//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (PostgreSQL), `` ` `` (MySQL), `[]` (T-SQL)
//! - Parameter placeholders: `@p1` (T-SQL, MySQL) vs `$1` (PostgreSQL)
//! - Row limiting: `TOP (n)` vs `LIMIT n`, `OFFSET FETCH` vs `LIMIT/OFFSET`
//! - Generated key retrieval after INSERT
//! - Native type names for each [`FieldType`]
//!
//! Dialects only describe text; nothing here executes SQL.
//!
//! # Usage
//!
//! ```ignore
//! use quarry::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::TSql;
//! let quoted = dialect.quote_identifier("Order");  // [Order]
//! ```

pub mod helpers;
mod mysql;
mod postgres;
mod tsql;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::token::TokenStream;
use super::types::FieldType;

/// How a dialect recovers generated key values after an INSERT so the full
/// row can be selected back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRetrieval {
    /// `OUTPUT INSERTED.<keys> INTO @holding`, then join the holding set back.
    OutputInto,
    /// `INSERT ... RETURNING <columns>`: the row comes back with the insert.
    Returning,
    /// Select back where the generated key equals the session's last insert id.
    LastInsertId { function: &'static str },
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifiers and Parameters
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - PostgreSQL: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Render a bound parameter.
    ///
    /// `name` is the generated binding name (`p1`), `position` its 1-based
    /// index within the command.
    fn placeholder(&self, name: &str, position: usize) -> String {
        let _ = position;
        helpers::placeholder_named(name)
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Row-limit prefix emitted right after `SELECT [DISTINCT]`.
    ///
    /// Returns `None` when the dialect limits rows with a trailing clause
    /// instead, in which case `emit_limit_offset` is used.
    fn emit_top(&self, n: u64) -> Option<TokenStream> {
        let _ = n;
        None
    }

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// - PostgreSQL/MySQL: `LIMIT n OFFSET m` (default)
    /// - T-SQL: `OFFSET m ROWS FETCH NEXT n ROWS ONLY` (override)
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/LIMIT.
    ///
    /// T-SQL requires ORDER BY when using OFFSET FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    // =========================================================================
    // JOIN Syntax
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }

    // =========================================================================
    // Generated Keys
    // =========================================================================

    /// Whether this dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        true
    }

    /// The idiom used to select an inserted row back.
    fn identity_retrieval(&self) -> IdentityRetrieval {
        IdentityRetrieval::Returning
    }

    /// Whether an INSERT with no columns can be written `DEFAULT VALUES`.
    ///
    /// MySQL needs `() VALUES ()` instead.
    fn supports_default_values(&self) -> bool {
        true
    }

    // =========================================================================
    // Type Names
    // =========================================================================

    /// Emit the native column type for a semantic field type.
    ///
    /// - `Int64` → BIGINT
    /// - `String` → TEXT (PostgreSQL/MySQL), NVARCHAR(MAX) (T-SQL)
    fn emit_data_type(&self, ty: &FieldType) -> String {
        helpers::emit_data_type_ansi(ty)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "mssql", alias = "sqlserver")]
    TSql,
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::TSql => &TSql,
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
        }
    }
}

/// Returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported dialect: {0}. Supported: tsql, mysql, postgres")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsql" | "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::TSql),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn placeholder(&self, name: &str, position: usize) -> String {
        self.dialect().placeholder(name, position)
    }

    fn emit_top(&self, n: u64) -> Option<TokenStream> {
        self.dialect().emit_top(n)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }

    fn supports_returning(&self) -> bool {
        self.dialect().supports_returning()
    }

    fn identity_retrieval(&self) -> IdentityRetrieval {
        self.dialect().identity_retrieval()
    }

    fn supports_default_values(&self) -> bool {
        self.dialect().supports_default_values()
    }

    fn emit_data_type(&self, ty: &FieldType) -> String {
        self.dialect().emit_data_type(ty)
    }
}
