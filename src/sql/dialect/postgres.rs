//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Positional `$n` parameters
//! - RETURNING clause, so an inserted row comes back without a second read

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, _name: &str, position: usize) -> String {
        helpers::placeholder_positional(position)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)
    // and default identity_retrieval (RETURNING)
}
